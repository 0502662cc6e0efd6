use pretty_assertions::assert_eq;
use pv_finance_core::solar::{
    model_solar_project, BindingConstraint, CostLineItem, ModelOptions, SeasonalProfile,
    SolarProjectInput,
};
use pv_finance_core::time_value;
use pv_finance_core::PvFinanceError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn tolerance() -> Decimal {
    dec!(0.000001)
}

fn with_monthly() -> ModelOptions {
    ModelOptions {
        include_monthly: true,
        ..ModelOptions::default()
    }
}

// ===========================================================================
// Reference 300 MW project
// ===========================================================================

#[test]
fn test_reference_scenario_year_one() {
    let out = model_solar_project(&SolarProjectInput::default(), &ModelOptions::default()).unwrap();
    let r = &out.result;

    assert_eq!(r.project_summary.total_capex, dec!(255_000_000));
    assert_eq!(r.first_year_operations.energy_mwh, dec!(577_920));
    assert_eq!(r.first_year_operations.revenue, dec!(37_564_800));
    assert_eq!(r.first_year_operations.opex, dec!(3_600_000));
    assert_eq!(r.first_year_operations.ebitda, dec!(33_964_800));
    assert_eq!(r.first_year_operations.cfads, dec!(25_473_600));
}

#[test]
fn test_reference_scenario_leverage_lifts_equity_returns() {
    let out = model_solar_project(&SolarProjectInput::default(), &ModelOptions::default()).unwrap();
    let m = &out.result.key_metrics;
    assert!(
        m.equity_irr > m.project_irr,
        "equity IRR {} should exceed project IRR {}",
        m.equity_irr,
        m.project_irr
    );
    assert!(m.min_dscr.is_some());
    assert!(m.avg_dscr >= m.min_dscr);
    assert!(m.lcoe > Decimal::ZERO && m.lcoe < m.ppa_price);
}

#[test]
fn test_financing_invariants() {
    for target_dscr in [dec!(1.0), dec!(1.3), dec!(1.6), dec!(2.5)] {
        let input = SolarProjectInput {
            target_dscr,
            ..SolarProjectInput::default()
        };
        let out = model_solar_project(&input, &ModelOptions::default()).unwrap();
        let f = &out.result.financing_structure;
        assert_eq!(f.final_debt, f.max_debt_by_dscr.min(f.max_debt_by_gearing));
        assert_eq!(f.equity + f.final_debt, out.result.project_summary.total_capex);
        let expected = if f.max_debt_by_dscr < f.max_debt_by_gearing {
            BindingConstraint::Dscr
        } else {
            BindingConstraint::Gearing
        };
        assert_eq!(f.binding_constraint, expected);
    }
}

#[test]
fn test_dscr_defined_exactly_within_tenor() {
    let out = model_solar_project(&SolarProjectInput::default(), &ModelOptions::default()).unwrap();
    let yearly = out.result.yearly_data.unwrap();
    let tenor = out.result.financing_structure.debt_tenor;
    for (year, dscr) in yearly.years.iter().zip(&yearly.dscr) {
        assert_eq!(dscr.is_some(), *year <= tenor, "year {year}");
    }
}

// ===========================================================================
// Cost basis scenarios
// ===========================================================================

#[test]
fn test_only_opex_items_rejected_on_capex() {
    let input = SolarProjectInput {
        capex_per_mw: None,
        opex_per_mw_year: None,
        cost_items: Some(vec![
            CostLineItem::opex("O&M", dec!(2_400_000)),
            CostLineItem::opex("Insurance", dec!(1_200_000)),
        ]),
        ..SolarProjectInput::default()
    };
    let err = model_solar_project(&input, &ModelOptions::default()).unwrap_err();
    assert!(matches!(err, PvFinanceError::NonPositiveCapex { .. }), "{err}");
}

#[test]
fn test_itemized_matches_equivalent_per_mw() {
    let itemized = SolarProjectInput {
        capex_per_mw: None,
        opex_per_mw_year: None,
        cost_items: Some(vec![
            CostLineItem::capex("EPC", dec!(850_000), dec!(300)),
            CostLineItem::opex("O&M", dec!(3_600_000)),
        ]),
        ..SolarProjectInput::default()
    };
    let a = model_solar_project(&itemized, &ModelOptions::default()).unwrap();
    let b = model_solar_project(&SolarProjectInput::default(), &ModelOptions::default()).unwrap();
    assert_eq!(a.result.financing_structure, b.result.financing_structure);
    assert_eq!(a.result.key_metrics, b.result.key_metrics);
}

#[test]
fn test_missing_cost_basis() {
    let input = SolarProjectInput {
        capex_per_mw: None,
        ..SolarProjectInput::default()
    };
    let err = model_solar_project(&input, &ModelOptions::default()).unwrap_err();
    assert!(matches!(err, PvFinanceError::MissingCostBasis));
}

// ===========================================================================
// Debt service
// ===========================================================================

#[test]
fn test_zero_interest_straight_line_service() {
    let input = SolarProjectInput {
        interest_rate: Decimal::ZERO,
        ..SolarProjectInput::default()
    };
    let out = model_solar_project(&input, &ModelOptions::default()).unwrap();
    let f = &out.result.financing_structure;
    assert_eq!(f.annual_debt_service, f.final_debt / Decimal::from(15));
}

// ===========================================================================
// Returns
// ===========================================================================

#[test]
fn test_npv_at_irr_is_zero() {
    let out = model_solar_project(&SolarProjectInput::default(), &ModelOptions::default()).unwrap();
    let r = &out.result;
    let yearly = r.yearly_data.as_ref().unwrap();

    let mut project_flows = vec![-r.project_summary.total_capex];
    project_flows.extend(yearly.cfads.iter().copied());
    let npv = time_value::npv(r.key_metrics.project_irr, &project_flows).unwrap();
    assert!(npv.abs() < tolerance(), "project NPV at IRR = {npv}");

    let mut equity_flows = vec![-r.financing_structure.equity];
    equity_flows.extend(yearly.fcf_to_equity.iter().copied());
    let npv = time_value::npv(r.key_metrics.equity_irr, &equity_flows).unwrap();
    assert!(npv.abs() < tolerance(), "equity NPV at IRR = {npv}");
}

#[test]
fn test_equity_payback_within_lifetime_when_recovered() {
    let out = model_solar_project(&SolarProjectInput::default(), &ModelOptions::default()).unwrap();
    let yearly = out.result.yearly_data.unwrap();
    let last = *yearly.cumulative_fcf_to_equity.last().unwrap();
    assert!(last >= Decimal::ZERO);

    let payback = out.result.key_metrics.equity_payback_years.unwrap();
    assert!(payback > Decimal::ZERO && payback <= dec!(25));
    assert!(out.warnings.is_empty(), "{:?}", out.warnings);
}

#[test]
fn test_non_converging_irr_is_reported_as_warning() {
    // At 5/MWh CFADS never repays capex; both IRR searches run out of range.
    let input = SolarProjectInput {
        ppa_price: dec!(5),
        ..SolarProjectInput::default()
    };
    let out = model_solar_project(&input, &ModelOptions::default()).unwrap();
    let r = &out.result;
    let yearly = r.yearly_data.as_ref().unwrap();

    let mut project_flows = vec![-r.project_summary.total_capex];
    project_flows.extend(yearly.cfads.iter().copied());
    let project = time_value::solve_irr(&project_flows, time_value::DEFAULT_IRR_GUESS);
    assert!(!project.converged);
    assert_eq!(r.key_metrics.project_irr, project.rate);

    let project_warning = out
        .warnings
        .iter()
        .find(|w| w.starts_with("Project IRR did not converge"))
        .expect("project IRR warning");
    assert!(project_warning.ends_with(&r.key_metrics.project_irr.to_string()));

    let equity_warning = out
        .warnings
        .iter()
        .find(|w| w.starts_with("Equity IRR did not converge"))
        .expect("equity IRR warning");
    assert!(equity_warning.ends_with(&r.key_metrics.equity_irr.to_string()));
}

// ===========================================================================
// Input magnitude
// ===========================================================================

#[test]
fn test_oversized_project_is_rejected_not_panicking() {
    let input = SolarProjectInput {
        capacity_mw: dec!(1_000_000_000_000_000),
        capex_per_mw: Some(dec!(1_000_000_000_000_000)),
        ..SolarProjectInput::default()
    };
    let result = std::panic::catch_unwind(|| model_solar_project(&input, &ModelOptions::default()));
    let err = result.expect("model must not panic").unwrap_err();
    assert!(matches!(err, PvFinanceError::InvalidInput { .. }), "{err}");
}

#[test]
fn test_largest_accepted_project_runs() {
    // Every magnitude and rate at its ceiling over the longest lifetime.
    let input = SolarProjectInput {
        capacity_mw: dec!(1_000_000),
        year_one_yield_mwh: dec!(1_000_000_000),
        capex_per_mw: Some(dec!(100_000)),
        opex_per_mw_year: Some(dec!(100_000)),
        ppa_price: dec!(100),
        ppa_escalation: Decimal::ONE,
        opex_escalation: Decimal::ONE,
        interest_rate: Decimal::ONE,
        discount_rate: Decimal::ONE,
        debt_tenor_years: 50,
        project_lifetime_years: 50,
        ..SolarProjectInput::default()
    };
    let out = model_solar_project(&input, &with_monthly()).unwrap();
    assert_eq!(out.result.monthly_data.map(|m| m.len()), Some(600));
}

// ===========================================================================
// Monthly disaggregation
// ===========================================================================

#[test]
fn test_monthly_sums_match_yearly() {
    let out = model_solar_project(&SolarProjectInput::default(), &with_monthly()).unwrap();
    let yearly = out.result.yearly_data.unwrap();
    let monthly = out.result.monthly_data.unwrap();
    assert_eq!(monthly.len(), 25 * 12);

    for (idx, rows) in monthly.chunks(12).enumerate() {
        let energy: Decimal = rows.iter().map(|m| m.energy_mwh).sum();
        let revenue: Decimal = rows.iter().map(|m| m.revenue).sum();
        let opex: Decimal = rows.iter().map(|m| m.opex).sum();
        let service: Decimal = rows.iter().map(|m| m.debt_service).sum();
        assert!((energy - yearly.energy_mwh[idx]).abs() < tolerance());
        assert!((revenue - yearly.revenue[idx]).abs() < tolerance());
        assert!((opex - yearly.opex[idx]).abs() < tolerance());
        assert!((service - yearly.debt_service[idx]).abs() < tolerance());
        assert_eq!(rows[0].month_name, "Jan");
        assert_eq!(rows[11].month_name, "Dec");
    }
}

#[test]
fn test_december_cumulative_matches_yearly() {
    let out = model_solar_project(&SolarProjectInput::default(), &with_monthly()).unwrap();
    let yearly = out.result.yearly_data.unwrap();
    let monthly = out.result.monthly_data.unwrap();

    for (idx, december) in monthly.iter().filter(|m| m.month == 12).enumerate() {
        let diff = december.cumulative_fcf_to_equity - yearly.cumulative_fcf_to_equity[idx];
        assert!(diff.abs() < tolerance(), "year {} drift {diff}", idx + 1);
    }
}

#[test]
fn test_custom_seasonal_profile() {
    let flat = SeasonalProfile::new([Decimal::ONE / dec!(12); 12]);
    // 1/12 does not terminate in decimal but lands within tolerance of 1.
    let options = ModelOptions {
        include_monthly: true,
        seasonal_profile: flat.unwrap(),
        ..ModelOptions::default()
    };
    let out = model_solar_project(&SolarProjectInput::default(), &options).unwrap();
    let monthly = out.result.monthly_data.unwrap();
    assert_eq!(monthly[0].energy_mwh, monthly[6].energy_mwh);
}

// ===========================================================================
// JSON contract
// ===========================================================================

#[test]
fn test_input_from_json_with_defaults() {
    let json = r#"{
        "capacity": 300,
        "p50_year_0_yield": 577920,
        "capex_per_mw": 850000,
        "om_cost_per_mw_year": 12000,
        "ppa_price": 65
    }"#;
    let input: SolarProjectInput = serde_json::from_str(json).unwrap();
    assert_eq!(input, SolarProjectInput::default());
}

#[test]
fn test_report_serializes_binding_constraint() {
    let out = model_solar_project(&SolarProjectInput::default(), &ModelOptions::default()).unwrap();
    let value = serde_json::to_value(&out).unwrap();
    assert_eq!(
        value["result"]["financing_structure"]["binding_constraint"],
        "Gearing"
    );
    assert!(value["result"].get("monthly_data").is_none());
}
