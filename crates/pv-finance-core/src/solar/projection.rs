use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use super::debt::YearlySeries;
use super::inputs::NormalizedInputs;
use super::seasonality::{SeasonalProfile, MONTH_NAMES};
use crate::types::{Energy, Money, Rate};

const MONTHS_PER_YEAR: u32 = 12;

/// Operating figures for one project year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearlyOperations {
    /// 1-based operating year
    pub year: u32,
    pub energy_mwh: Energy,
    pub revenue: Money,
    pub opex: Money,
    pub ebitda: Money,
    /// After-tax operating cash flow
    pub cfads: Money,
}

/// Year-by-year operating cash flows, parallel series indexed by year - 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingCashFlows {
    pub years: Vec<u32>,
    pub energy_mwh: Vec<Energy>,
    pub revenue: Vec<Money>,
    pub opex: Vec<Money>,
    pub ebitda: Vec<Money>,
    pub cfads: Vec<Money>,
}

impl OperatingCashFlows {
    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Row for a 1-based year, if within the projection.
    pub fn year(&self, year: u32) -> Option<YearlyOperations> {
        let idx = (year as usize).checked_sub(1)?;
        Some(YearlyOperations {
            year: *self.years.get(idx)?,
            energy_mwh: self.energy_mwh[idx],
            revenue: self.revenue[idx],
            opex: self.opex[idx],
            ebitda: self.ebitda[idx],
            cfads: self.cfads[idx],
        })
    }
}

/// One month of the disaggregated projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyOperations {
    pub year: u32,
    /// 1 = January
    pub month: u32,
    pub month_name: String,
    pub energy_mwh: Energy,
    pub revenue: Money,
    pub opex: Money,
    pub ebitda: Money,
    pub cfads: Money,
    pub debt_service: Money,
    pub fcf_to_equity: Money,
    pub cumulative_fcf_to_equity: Money,
}

/// (1 + rate)^(year - 1), the escalation applied to a year-1 baseline.
fn growth_factor(rate: Rate, year: u32) -> Decimal {
    (Decimal::ONE + rate).powu(u64::from(year.saturating_sub(1)))
}

/// Project a single operating year.
///
/// Each stream is its year-1 baseline times a power of its rate, never the
/// previous year's value rolled forward.
pub fn project_year(inputs: &NormalizedInputs, year: u32) -> YearlyOperations {
    let energy_mwh =
        inputs.year_one_yield_mwh * growth_factor(-inputs.degradation_rate, year);
    let revenue = energy_mwh * escalated_ppa_price(inputs, year);
    let opex = inputs.total_opex_year_one * growth_factor(inputs.opex_escalation, year);
    let ebitda = revenue - opex;
    let cfads = ebitda * (Decimal::ONE - inputs.tax_rate);

    YearlyOperations {
        year,
        energy_mwh,
        revenue,
        opex,
        ebitda,
        cfads,
    }
}

/// PPA price in force during `year`.
pub fn escalated_ppa_price(inputs: &NormalizedInputs, year: u32) -> Money {
    inputs.ppa_price * growth_factor(inputs.ppa_escalation, year)
}

/// Project every year of the operating lifetime.
pub fn project_cash_flows(inputs: &NormalizedInputs) -> OperatingCashFlows {
    let n = inputs.project_lifetime_years as usize;
    let mut flows = OperatingCashFlows {
        years: Vec::with_capacity(n),
        energy_mwh: Vec::with_capacity(n),
        revenue: Vec::with_capacity(n),
        opex: Vec::with_capacity(n),
        ebitda: Vec::with_capacity(n),
        cfads: Vec::with_capacity(n),
    };

    for year in 1..=inputs.project_lifetime_years {
        let row = project_year(inputs, year);
        flows.years.push(row.year);
        flows.energy_mwh.push(row.energy_mwh);
        flows.revenue.push(row.revenue);
        flows.opex.push(row.opex);
        flows.ebitda.push(row.ebitda);
        flows.cfads.push(row.cfads);
    }

    tracing::debug!(
        years = flows.len(),
        year_one_cfads = %flows.cfads.first().copied().unwrap_or_default(),
        "projected operating cash flows"
    );

    flows
}

/// Split each year into months.
///
/// Energy follows the seasonal weights and is sold at that year's escalated
/// PPA price. OpEx and debt service are contractual and spread evenly. The
/// cumulative equity cash flow continues from the yearly series' seed, so
/// each December matches the yearly cumulative.
pub fn project_monthly(
    inputs: &NormalizedInputs,
    yearly: &YearlySeries,
    equity: Money,
    profile: &SeasonalProfile,
) -> Vec<MonthlyOperations> {
    let months = Decimal::from(MONTHS_PER_YEAR);
    let mut rows = Vec::with_capacity(yearly.years.len() * MONTHS_PER_YEAR as usize);
    let mut cumulative = -equity;

    for (idx, &year) in yearly.years.iter().enumerate() {
        let price = escalated_ppa_price(inputs, year);
        let opex = yearly.opex[idx] / months;
        let debt_service = yearly.debt_service[idx] / months;

        for month in 1..=MONTHS_PER_YEAR {
            let energy_mwh = yearly.energy_mwh[idx] * profile.weight(month);
            let revenue = energy_mwh * price;
            let ebitda = revenue - opex;
            let cfads = ebitda * (Decimal::ONE - inputs.tax_rate);
            let fcf_to_equity = cfads - debt_service;
            cumulative += fcf_to_equity;

            rows.push(MonthlyOperations {
                year,
                month,
                month_name: MONTH_NAMES[(month - 1) as usize].to_string(),
                energy_mwh,
                revenue,
                opex,
                ebitda,
                cfads,
                debt_service,
                fcf_to_equity,
                cumulative_fcf_to_equity: cumulative,
            });
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solar::inputs::{normalize, SolarProjectInput};
    use rust_decimal_macros::dec;

    fn reference_inputs() -> NormalizedInputs {
        normalize(&SolarProjectInput::default()).unwrap()
    }

    #[test]
    fn test_year_one_figures() {
        let row = project_year(&reference_inputs(), 1);
        assert_eq!(row.energy_mwh, dec!(577_920));
        assert_eq!(row.revenue, dec!(37_564_800));
        assert_eq!(row.opex, dec!(3_600_000));
        assert_eq!(row.ebitda, dec!(33_964_800));
        assert_eq!(row.cfads, dec!(25_473_600));
    }

    #[test]
    fn test_energy_strictly_decreasing_with_degradation() {
        let flows = project_cash_flows(&reference_inputs());
        assert_eq!(flows.len(), 25);
        for pair in flows.energy_mwh.windows(2) {
            assert!(pair[1] < pair[0], "{} should be < {}", pair[1], pair[0]);
        }
    }

    #[test]
    fn test_energy_flat_without_degradation() {
        let mut inputs = reference_inputs();
        inputs.degradation_rate = Decimal::ZERO;
        let flows = project_cash_flows(&inputs);
        assert!(flows.energy_mwh.iter().all(|e| *e == dec!(577_920)));
    }

    #[test]
    fn test_year_values_use_direct_powers() {
        let inputs = reference_inputs();
        let year_ten = project_year(&inputs, 10);
        let expected_energy = dec!(577_920) * dec!(0.996).powu(9);
        let expected_opex = dec!(3_600_000) * dec!(1.01).powu(9);
        assert_eq!(year_ten.energy_mwh, expected_energy);
        assert_eq!(year_ten.opex, expected_opex);
    }

    #[test]
    fn test_ppa_escalation_applies_to_revenue() {
        let mut inputs = reference_inputs();
        inputs.ppa_escalation = dec!(0.02);
        inputs.degradation_rate = Decimal::ZERO;
        let year_two = project_year(&inputs, 2);
        assert_eq!(year_two.revenue, dec!(577_920) * dec!(65) * dec!(1.02));
    }

    #[test]
    fn test_year_lookup_out_of_range() {
        let flows = project_cash_flows(&reference_inputs());
        assert!(flows.year(0).is_none());
        assert!(flows.year(26).is_none());
        assert_eq!(flows.year(25).unwrap().year, 25);
    }
}
