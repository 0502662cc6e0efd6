use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::assessment::{assess, Assessment};
use super::debt::{build_yearly_series, size_debt, FinancingStructure, YearlySeries};
use super::inputs::{normalize, CostItemsBreakdown, NormalizedInputs, SolarProjectInput};
use super::projection::{project_cash_flows, project_monthly, MonthlyOperations, YearlyOperations};
use super::returns::{compute_key_metrics, KeyMetrics};
use super::seasonality::SeasonalProfile;
use crate::error::PvFinanceError;
use crate::types::{with_metadata, ComputationOutput, Energy, Money, Rate};
use crate::PvFinanceResult;

const HOURS_PER_YEAR: Decimal = dec!(8760);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which optional series to attach to the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    pub include_yearly: bool,
    pub include_monthly: bool,
    pub seasonal_profile: SeasonalProfile,
}

impl Default for ModelOptions {
    fn default() -> Self {
        ModelOptions {
            include_yearly: true,
            include_monthly: false,
            seasonal_profile: SeasonalProfile::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub project_name: Option<String>,
    pub capacity_mw: Decimal,
    /// Year-one yield / (capacity × 8760 h)
    pub capacity_factor: Rate,
    pub year_one_yield_mwh: Energy,
    pub project_lifetime_years: u32,
    pub total_capex: Money,
    pub capex_per_mw: Money,
}

pub type FirstYearOperations = YearlyOperations;

/// Complete output of one project model run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarProjectReport {
    pub project_summary: ProjectSummary,
    pub financing_structure: FinancingStructure,
    pub key_metrics: KeyMetrics,
    pub first_year_operations: FirstYearOperations,
    pub assessment: Assessment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yearly_data: Option<YearlySeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_data: Option<Vec<MonthlyOperations>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_items_breakdown: Option<CostItemsBreakdown>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Run the full bankability model: normalise inputs, project operations,
/// size debt, compute returns and classify the result.
pub fn model_solar_project(
    input: &SolarProjectInput,
    options: &ModelOptions,
) -> PvFinanceResult<ComputationOutput<SolarProjectReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let inputs = normalize(input)?;
    let flows = project_cash_flows(&inputs);
    let financing = size_debt(&inputs, &flows)?;
    let series = build_yearly_series(&flows, &financing);
    let key_metrics = compute_key_metrics(&inputs, &series, &financing, &mut warnings)?;

    collect_warnings(&inputs, &key_metrics, &mut warnings);

    let first_year_operations = flows.year(1).ok_or_else(|| {
        PvFinanceError::invalid("project_lifetime_years", "Projection produced no operating years")
    })?;

    let monthly_data = options.include_monthly.then(|| {
        project_monthly(&inputs, &series, financing.equity, &options.seasonal_profile)
    });

    let report = SolarProjectReport {
        project_summary: project_summary(input.project_name.clone(), &inputs),
        assessment: assess(&key_metrics),
        financing_structure: financing,
        key_metrics,
        first_year_operations,
        yearly_data: options.include_yearly.then_some(series),
        monthly_data,
        cost_items_breakdown: inputs.cost_items_breakdown.clone(),
    };

    tracing::debug!(
        recommendation = ?report.assessment.overall.recommendation,
        warnings = warnings.len(),
        "modelled solar project"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Utility-scale solar project finance (DSCR/gearing debt sizing)",
        &serde_json::json!({
            "capacity_mw": inputs.capacity_mw.to_string(),
            "year_one_yield_mwh": inputs.year_one_yield_mwh.to_string(),
            "ppa_price": inputs.ppa_price.to_string(),
            "cost_basis": if inputs.cost_items_breakdown.is_some() { "itemized" } else { "per_mw" },
            "gearing_ratio": inputs.gearing_ratio.to_string(),
            "target_dscr": inputs.target_dscr.to_string(),
            "interest_rate": inputs.interest_rate.to_string(),
            "debt_tenor_years": inputs.debt_tenor_years,
            "project_lifetime_years": inputs.project_lifetime_years,
            "discount_rate": inputs.discount_rate.to_string(),
        }),
        warnings,
        elapsed,
        report,
    ))
}

fn project_summary(project_name: Option<String>, inputs: &NormalizedInputs) -> ProjectSummary {
    ProjectSummary {
        project_name,
        capacity_mw: inputs.capacity_mw,
        capacity_factor: inputs.year_one_yield_mwh / (inputs.capacity_mw * HOURS_PER_YEAR),
        year_one_yield_mwh: inputs.year_one_yield_mwh,
        project_lifetime_years: inputs.project_lifetime_years,
        total_capex: inputs.total_capex,
        capex_per_mw: inputs.capex_per_mw,
    }
}

fn collect_warnings(inputs: &NormalizedInputs, metrics: &KeyMetrics, warnings: &mut Vec<String>) {
    if let Some(min_dscr) = metrics.min_dscr {
        if min_dscr < inputs.target_dscr {
            tracing::warn!(%min_dscr, target = %inputs.target_dscr, "minimum DSCR below target");
            warnings.push(format!(
                "Minimum DSCR {} is below the target of {}",
                min_dscr.round_dp(2),
                inputs.target_dscr
            ));
        }
    }

    if metrics.lcoe > inputs.ppa_price {
        tracing::warn!(lcoe = %metrics.lcoe, ppa_price = %inputs.ppa_price, "LCOE above PPA price");
        warnings.push(format!(
            "LCOE {} exceeds the PPA price {}",
            metrics.lcoe.round_dp(2),
            inputs.ppa_price
        ));
    }

    if metrics.equity_payback_years.is_none() {
        tracing::warn!("equity payback not reached");
        warnings.push(format!(
            "Equity is not paid back within the {}-year lifetime",
            inputs.project_lifetime_years
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solar::assessment::Recommendation;
    use crate::solar::inputs::CostLineItem;

    #[test]
    fn test_reference_report_shape() {
        let out = model_solar_project(&SolarProjectInput::default(), &ModelOptions::default()).unwrap();
        let report = &out.result;
        assert_eq!(report.project_summary.total_capex, dec!(255_000_000));
        assert_eq!(report.first_year_operations.cfads, dec!(25_473_600));
        assert_eq!(report.yearly_data.as_ref().map(|y| y.years.len()), Some(25));
        assert!(report.monthly_data.is_none());
        assert!(report.cost_items_breakdown.is_none());
    }

    #[test]
    fn test_capacity_factor() {
        let out = model_solar_project(&SolarProjectInput::default(), &ModelOptions::default()).unwrap();
        // 577,920 / (300 × 8760) = 0.2199...
        let cf = out.result.project_summary.capacity_factor;
        assert_eq!(cf, dec!(577_920) / dec!(2_628_000));
    }

    #[test]
    fn test_options_toggle_series() {
        let options = ModelOptions {
            include_yearly: false,
            include_monthly: true,
            ..ModelOptions::default()
        };
        let out = model_solar_project(&SolarProjectInput::default(), &options).unwrap();
        assert!(out.result.yearly_data.is_none());
        assert_eq!(out.result.monthly_data.map(|m| m.len()), Some(300));
    }

    #[test]
    fn test_itemized_breakdown_is_reported() {
        let input = SolarProjectInput {
            capex_per_mw: None,
            opex_per_mw_year: None,
            cost_items: Some(vec![
                CostLineItem::capex("Modules", dec!(500_000), dec!(300)),
                CostLineItem::capex("BOS", dec!(350_000), dec!(300)),
                CostLineItem::opex("O&M", dec!(3_600_000)),
            ]),
            ..SolarProjectInput::default()
        };
        let out = model_solar_project(&input, &ModelOptions::default()).unwrap();
        let breakdown = out.result.cost_items_breakdown.unwrap();
        assert_eq!(breakdown.items.len(), 3);
        assert_eq!(breakdown.total_capex, dec!(255_000_000));
    }

    #[test]
    fn test_uneconomic_project_warns() {
        let input = SolarProjectInput {
            ppa_price: dec!(20),
            ..SolarProjectInput::default()
        };
        let out = model_solar_project(&input, &ModelOptions::default()).unwrap();
        assert!(out.warnings.iter().any(|w| w.starts_with("LCOE")));
        assert!(out.warnings.iter().any(|w| w.starts_with("Equity is not paid back")));
        assert_eq!(
            out.result.assessment.overall.recommendation,
            Recommendation::DoNotProceed
        );
    }

    #[test]
    fn test_envelope_metadata() {
        let out = model_solar_project(&SolarProjectInput::default(), &ModelOptions::default()).unwrap();
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
        assert_eq!(out.assumptions["cost_basis"], "per_mw");
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: ModelOptions = serde_json::from_str(r#"{"include_monthly": true}"#).unwrap();
        assert!(options.include_yearly);
        assert!(options.include_monthly);
        assert_eq!(options.seasonal_profile, SeasonalProfile::default());
    }
}
