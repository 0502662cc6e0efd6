use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use super::debt::{FinancingStructure, YearlySeries};
use super::inputs::NormalizedInputs;
use crate::error::PvFinanceError;
use crate::time_value::{self, IrrSolution, DEFAULT_IRR_GUESS};
use crate::types::{Money, Multiple, Rate, Years};
use crate::PvFinanceResult;

/// Headline bankability metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMetrics {
    /// IRR of [-total CapEx, CFADS...]
    pub project_irr: Rate,
    /// IRR of [-equity, FCF to equity...]
    pub equity_irr: Rate,
    /// Levelized cost of energy per MWh
    pub lcoe: Money,
    /// Lowest DSCR over the tenor (None without debt service)
    pub min_dscr: Option<Multiple>,
    /// Average DSCR over the tenor (None without debt service)
    pub avg_dscr: Option<Multiple>,
    /// NPV of project cash flows at the discount rate
    pub project_npv: Money,
    /// Year-one PPA price, for comparison with LCOE
    pub ppa_price: Money,
    pub equity_payback_years: Option<Years>,
    pub project_payback_years: Option<Years>,
}

/// Compute every metric from the finished yearly series.
///
/// IRR searches that fail to converge keep their best-effort rate and add a
/// warning.
pub fn compute_key_metrics(
    inputs: &NormalizedInputs,
    series: &YearlySeries,
    financing: &FinancingStructure,
    warnings: &mut Vec<String>,
) -> PvFinanceResult<KeyMetrics> {
    let project = solve_labelled_irr(
        "Project IRR",
        &project_cash_flows(inputs.total_capex, &series.cfads),
        warnings,
    );
    let equity = solve_labelled_irr(
        "Equity IRR",
        &equity_cash_flows(financing.equity, &series.fcf_to_equity),
        warnings,
    );

    let lcoe = lcoe(inputs, series)?;
    let (min_dscr, avg_dscr) = dscr_statistics(&series.dscr, inputs.debt_tenor_years);
    let project_npv = project_npv(inputs.discount_rate, inputs.total_capex, &series.cfads);

    let lifetime = inputs.project_lifetime_years;
    let equity_payback_years = payback_years(-financing.equity, &series.fcf_to_equity, lifetime);
    let project_payback_years = payback_years(-inputs.total_capex, &series.cfads, lifetime);

    tracing::debug!(
        project_irr = %project.rate,
        equity_irr = %equity.rate,
        lcoe = %lcoe,
        project_npv = %project_npv,
        "computed key metrics"
    );

    Ok(KeyMetrics {
        project_irr: project.rate,
        equity_irr: equity.rate,
        lcoe,
        min_dscr,
        avg_dscr,
        project_npv,
        ppa_price: inputs.ppa_price,
        equity_payback_years,
        project_payback_years,
    })
}

fn solve_labelled_irr(label: &str, cash_flows: &[Money], warnings: &mut Vec<String>) -> IrrSolution {
    let solution = time_value::solve_irr(cash_flows, DEFAULT_IRR_GUESS);
    if !solution.converged {
        tracing::warn!(
            label,
            rate = %solution.rate,
            iterations = solution.iterations,
            "IRR search did not converge"
        );
        warnings.push(format!(
            "{label} did not converge after {} iterations; reporting last estimate {}",
            solution.iterations, solution.rate
        ));
    }
    solution
}

/// [-total CapEx, CFADS(1), ..., CFADS(n)]
pub fn project_cash_flows(total_capex: Money, cfads: &[Money]) -> Vec<Money> {
    std::iter::once(-total_capex).chain(cfads.iter().copied()).collect()
}

/// [-equity, FCFE(1), ..., FCFE(n)]
pub fn equity_cash_flows(equity: Money, fcf_to_equity: &[Money]) -> Vec<Money> {
    std::iter::once(-equity)
        .chain(fcf_to_equity.iter().copied())
        .collect()
}

/// Discounted lifetime cost over discounted lifetime energy.
///
/// Energy is discounted at the same rate as money.
pub fn lcoe(inputs: &NormalizedInputs, series: &YearlySeries) -> PvFinanceResult<Money> {
    let costs: Vec<Money> = std::iter::once(inputs.total_capex)
        .chain(series.opex.iter().copied())
        .collect();
    let energy: Vec<Money> = std::iter::once(Decimal::ZERO)
        .chain(series.energy_mwh.iter().copied())
        .collect();

    let npv_costs = time_value::npv(inputs.discount_rate, &costs)?;
    let npv_energy = time_value::npv(inputs.discount_rate, &energy)?;

    if npv_energy.is_zero() {
        return Err(PvFinanceError::DivisionByZero {
            context: "LCOE discounted energy".into(),
        });
    }

    npv_costs
        .checked_div(npv_energy)
        .ok_or_else(|| PvFinanceError::overflow("LCOE"))
}

/// Min and average of the defined DSCRs within the tenor.
pub fn dscr_statistics(dscr: &[Option<Multiple>], tenor: u32) -> (Option<Multiple>, Option<Multiple>) {
    let defined: Vec<Multiple> = dscr
        .iter()
        .take(tenor as usize)
        .filter_map(|d| *d)
        .collect();

    if defined.is_empty() {
        return (None, None);
    }

    let min = defined.iter().copied().min();
    let avg = defined
        .iter()
        .try_fold(Decimal::ZERO, |acc, d| acc.checked_add(*d))
        .map(|sum| sum / Decimal::from(defined.len() as u64));
    (min, avg)
}

/// -total CapEx + Σ CFADS(t) / (1 + rate)^t
pub fn project_npv(discount_rate: Rate, total_capex: Money, cfads: &[Money]) -> Money {
    let one_plus_r = Decimal::ONE + discount_rate;
    let pv_cfads: Money = cfads
        .iter()
        .enumerate()
        .map(|(idx, cf)| cf / one_plus_r.powu(idx as u64 + 1))
        .sum();
    -total_capex + pv_cfads
}

/// Years until a running position that starts at `seed` first turns
/// non-negative, interpolated linearly within the crossing year.
///
/// If the position never crosses from negative but finishes non-negative,
/// the full `lifetime` is returned; if it finishes negative, None.
pub fn payback_years(seed: Money, flows: &[Money], lifetime: u32) -> Option<Years> {
    let mut cumulative = seed;

    for (idx, flow) in flows.iter().enumerate() {
        let previous = cumulative;
        cumulative += flow;

        if previous < Decimal::ZERO && cumulative >= Decimal::ZERO {
            let fraction = if flow.is_zero() {
                Decimal::ZERO
            } else {
                -previous / flow
            };
            return Some(Decimal::from(idx as u64) + fraction);
        }
    }

    if cumulative < Decimal::ZERO {
        None
    } else {
        Some(Decimal::from(lifetime))
    }
}
