use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use super::inputs::NormalizedInputs;
use super::projection::OperatingCashFlows;
use crate::error::PvFinanceError;
use crate::time_value;
use crate::types::{Energy, Money, Multiple, Rate};
use crate::PvFinanceResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Which sizing limit set the final debt amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingConstraint {
    #[serde(rename = "DSCR")]
    Dscr,
    Gearing,
}

/// Debt sized against both constraints, and the resulting capital split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingStructure {
    /// CFADS over the tenor discounted at the interest rate
    pub pv_of_cfads: Money,
    /// PV of tenor CFADS / target DSCR
    pub max_debt_by_dscr: Money,
    /// Total CapEx × gearing ratio
    pub max_debt_by_gearing: Money,
    /// min(max_debt_by_dscr, max_debt_by_gearing)
    pub final_debt: Money,
    /// Total CapEx - final debt
    pub equity: Money,
    /// final_debt / total CapEx
    pub actual_gearing: Rate,
    pub binding_constraint: BindingConstraint,
    pub interest_rate: Rate,
    pub debt_tenor: u32,
    /// Level annuity payment retiring final_debt over the tenor
    pub annual_debt_service: Money,
}

/// Full yearly series: operations plus debt service and equity cash flows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlySeries {
    pub years: Vec<u32>,
    pub energy_mwh: Vec<Energy>,
    pub revenue: Vec<Money>,
    pub opex: Vec<Money>,
    pub ebitda: Vec<Money>,
    pub cfads: Vec<Money>,
    pub debt_service: Vec<Money>,
    /// None after the tenor, or when there is no debt service to cover
    pub dscr: Vec<Option<Multiple>>,
    pub fcf_to_equity: Vec<Money>,
    /// Running equity position, starting from -equity at financial close
    pub cumulative_fcf_to_equity: Vec<Money>,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Present value of CFADS over the debt tenor at the debt interest rate.
pub fn pv_of_tenor_cfads(inputs: &NormalizedInputs, flows: &OperatingCashFlows) -> Money {
    let one_plus_r = Decimal::ONE + inputs.interest_rate;
    flows
        .cfads
        .iter()
        .take(inputs.debt_tenor_years as usize)
        .enumerate()
        .map(|(idx, cfads)| cfads / one_plus_r.powu(idx as u64 + 1))
        .sum()
}

/// Size senior debt as the lower of the DSCR and gearing limits.
///
/// An exact tie between the two limits is reported as gearing-bound.
pub fn size_debt(
    inputs: &NormalizedInputs,
    flows: &OperatingCashFlows,
) -> PvFinanceResult<FinancingStructure> {
    let pv_of_cfads = pv_of_tenor_cfads(inputs, flows);
    let max_debt_by_dscr = pv_of_cfads
        .checked_div(inputs.target_dscr)
        .ok_or_else(|| PvFinanceError::overflow("DSCR debt limit (PV of CFADS / target DSCR)"))?;
    let max_debt_by_gearing = inputs.total_capex * inputs.gearing_ratio;

    let (final_debt, binding_constraint) = if max_debt_by_dscr < max_debt_by_gearing {
        (max_debt_by_dscr, BindingConstraint::Dscr)
    } else {
        (max_debt_by_gearing, BindingConstraint::Gearing)
    };

    let equity = inputs.total_capex - final_debt;
    let annual_debt_service = annual_debt_service(
        inputs.interest_rate,
        inputs.debt_tenor_years,
        final_debt,
    )?;

    tracing::debug!(
        max_debt_by_dscr = %max_debt_by_dscr,
        max_debt_by_gearing = %max_debt_by_gearing,
        binding = ?binding_constraint,
        annual_debt_service = %annual_debt_service,
        "sized project debt"
    );

    Ok(FinancingStructure {
        pv_of_cfads,
        max_debt_by_dscr,
        max_debt_by_gearing,
        final_debt,
        equity,
        actual_gearing: final_debt / inputs.total_capex,
        binding_constraint,
        interest_rate: inputs.interest_rate,
        debt_tenor: inputs.debt_tenor_years,
        annual_debt_service,
    })
}

/// Level annuity payment on `debt`; straight-line when the rate is zero.
pub fn annual_debt_service(rate: Rate, tenor: u32, debt: Money) -> PvFinanceResult<Money> {
    Ok(-time_value::pmt(rate, tenor, debt, Decimal::ZERO)?)
}

/// Coverage for a 1-based year: None past the tenor, with no debt service,
/// or when a vanishing debt service puts the ratio out of decimal range.
pub fn dscr_for_year(
    cfads: Money,
    year: u32,
    tenor: u32,
    annual_debt_service: Money,
) -> Option<Multiple> {
    if year > tenor || annual_debt_service.is_zero() {
        return None;
    }
    cfads.checked_div(annual_debt_service)
}

/// Layer debt service onto the operating projection.
pub fn build_yearly_series(
    flows: &OperatingCashFlows,
    financing: &FinancingStructure,
) -> YearlySeries {
    let n = flows.len();
    let mut debt_service = Vec::with_capacity(n);
    let mut dscr = Vec::with_capacity(n);
    let mut fcf_to_equity = Vec::with_capacity(n);
    let mut cumulative_fcf_to_equity = Vec::with_capacity(n);
    let mut cumulative = -financing.equity;

    for (idx, &year) in flows.years.iter().enumerate() {
        let cfads = flows.cfads[idx];
        let service = if year <= financing.debt_tenor {
            financing.annual_debt_service
        } else {
            Decimal::ZERO
        };
        let fcf = cfads - service;
        cumulative += fcf;

        debt_service.push(service);
        dscr.push(dscr_for_year(
            cfads,
            year,
            financing.debt_tenor,
            financing.annual_debt_service,
        ));
        fcf_to_equity.push(fcf);
        cumulative_fcf_to_equity.push(cumulative);
    }

    YearlySeries {
        years: flows.years.clone(),
        energy_mwh: flows.energy_mwh.clone(),
        revenue: flows.revenue.clone(),
        opex: flows.opex.clone(),
        ebitda: flows.ebitda.clone(),
        cfads: flows.cfads.clone(),
        debt_service,
        dscr,
        fcf_to_equity,
        cumulative_fcf_to_equity,
    }
}
