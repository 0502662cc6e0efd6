use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PvFinanceError;
use crate::types::{Energy, Money, Multiple, Rate};
use crate::PvFinanceResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// A single cost entry from an itemized cost build-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLineItem {
    /// Line item name (e.g. "Modules", "Inverters", "Site lease")
    pub name: String,
    /// Total cost of the line. For CapEx items this is unit_price × quantity.
    pub amount: Money,
    /// True for CapEx, false for yearly OpEx
    pub is_capex: bool,
    /// Price per unit (CapEx only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Money>,
    /// Number of units (CapEx only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,
    /// Per-item escalation override (OpEx only). Carried through for display;
    /// the model escalates all OpEx at the project-wide rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_rate: Option<Rate>,
}

impl CostLineItem {
    /// CapEx line priced as unit_price × quantity.
    pub fn capex(name: &str, unit_price: Money, quantity: Decimal) -> Self {
        CostLineItem {
            name: name.into(),
            amount: unit_price.saturating_mul(quantity),
            is_capex: true,
            unit_price: Some(unit_price),
            quantity: Some(quantity),
            escalation_rate: None,
        }
    }

    /// Yearly OpEx line.
    pub fn opex(name: &str, amount: Money) -> Self {
        CostLineItem {
            name: name.into(),
            amount,
            is_capex: false,
            unit_price: None,
            quantity: None,
            escalation_rate: None,
        }
    }

    /// Amount the line contributes to its cost total, None if
    /// unit_price × quantity leaves the decimal range.
    pub fn effective_amount(&self) -> Option<Money> {
        match (self.is_capex, self.unit_price, self.quantity) {
            (true, Some(price), Some(qty)) => price.checked_mul(qty),
            _ => Some(self.amount),
        }
    }
}

/// Raw project inputs as supplied by the caller (form, JSON file, bindings).
///
/// Costs arrive in one of two shapes: an itemized `cost_items` list, or the
/// scalar `capex_per_mw` / `opex_per_mw_year` pair. [`normalize`] resolves
/// them into a single [`NormalizedInputs`] record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarProjectInput {
    /// Project name / identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    /// Installed capacity in MW
    #[serde(alias = "capacity")]
    pub capacity_mw: Decimal,
    /// Expected (P50) energy yield of the first operating year, MWh
    #[serde(alias = "p50_year_0_yield")]
    pub year_one_yield_mwh: Energy,
    /// CapEx per MW (ignored when cost_items is non-empty)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capex_per_mw: Option<Money>,
    /// O&M cost per MW per year (ignored when cost_items is non-empty)
    #[serde(
        default,
        alias = "om_cost_per_mw_year",
        skip_serializing_if = "Option::is_none"
    )]
    pub opex_per_mw_year: Option<Money>,
    /// Itemized CapEx / OpEx entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_items: Option<Vec<CostLineItem>>,
    /// PPA price per MWh in year 1
    pub ppa_price: Money,
    /// Annual energy degradation (0.004 = 0.4%/year)
    #[serde(default = "default_degradation_rate")]
    pub degradation_rate: Rate,
    /// Annual PPA price escalation
    #[serde(default)]
    pub ppa_escalation: Rate,
    /// Annual OpEx escalation, applied to every OpEx line
    #[serde(default = "default_opex_escalation", alias = "om_escalation")]
    pub opex_escalation: Rate,
    /// Maximum debt as a fraction of total CapEx
    #[serde(default = "default_gearing_ratio")]
    pub gearing_ratio: Rate,
    /// Annual interest rate on senior debt
    #[serde(default = "default_interest_rate")]
    pub interest_rate: Rate,
    /// Debt tenor in years
    #[serde(default = "default_debt_tenor", alias = "debt_tenor")]
    pub debt_tenor_years: u32,
    /// Target DSCR used to size debt (e.g. 1.30)
    #[serde(default = "default_target_dscr")]
    pub target_dscr: Multiple,
    /// Operating lifetime in years
    #[serde(default = "default_project_lifetime", alias = "project_lifetime")]
    pub project_lifetime_years: u32,
    /// Tax rate applied to EBITDA
    #[serde(default = "default_tax_rate")]
    pub tax_rate: Rate,
    /// Discount rate for NPV and LCOE
    #[serde(default = "default_discount_rate")]
    pub discount_rate: Rate,
}

fn default_degradation_rate() -> Rate {
    dec!(0.004)
}

fn default_opex_escalation() -> Rate {
    dec!(0.01)
}

fn default_gearing_ratio() -> Rate {
    dec!(0.75)
}

fn default_interest_rate() -> Rate {
    dec!(0.045)
}

fn default_debt_tenor() -> u32 {
    15
}

fn default_target_dscr() -> Multiple {
    dec!(1.30)
}

fn default_project_lifetime() -> u32 {
    25
}

fn default_tax_rate() -> Rate {
    dec!(0.25)
}

fn default_discount_rate() -> Rate {
    dec!(0.08)
}

impl Default for SolarProjectInput {
    /// Reference 300 MW project: 300 MW × 22% CF × 8760 h = 577,920 MWh.
    fn default() -> Self {
        SolarProjectInput {
            project_name: None,
            capacity_mw: dec!(300),
            year_one_yield_mwh: dec!(577_920),
            capex_per_mw: Some(dec!(850_000)),
            opex_per_mw_year: Some(dec!(12_000)),
            cost_items: None,
            ppa_price: dec!(65),
            degradation_rate: default_degradation_rate(),
            ppa_escalation: Decimal::ZERO,
            opex_escalation: default_opex_escalation(),
            gearing_ratio: default_gearing_ratio(),
            interest_rate: default_interest_rate(),
            debt_tenor_years: default_debt_tenor(),
            target_dscr: default_target_dscr(),
            project_lifetime_years: default_project_lifetime(),
            tax_rate: default_tax_rate(),
            discount_rate: default_discount_rate(),
        }
    }
}

/// The cost shape a request was expressed in.
#[derive(Debug, Clone, PartialEq)]
pub enum CostBasis {
    /// Totals come from summing line items
    Itemized(Vec<CostLineItem>),
    /// Totals come from per-MW scalars
    PerMw {
        capex_per_mw: Money,
        opex_per_mw_year: Money,
    },
}

impl SolarProjectInput {
    /// Pick the cost shape: a non-empty item list wins over the scalars.
    pub fn cost_basis(&self) -> PvFinanceResult<CostBasis> {
        match &self.cost_items {
            Some(items) if !items.is_empty() => Ok(CostBasis::Itemized(items.clone())),
            _ => match (self.capex_per_mw, self.opex_per_mw_year) {
                (Some(capex_per_mw), Some(opex_per_mw_year)) => Ok(CostBasis::PerMw {
                    capex_per_mw,
                    opex_per_mw_year,
                }),
                _ => Err(PvFinanceError::MissingCostBasis),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Normalized record
// ---------------------------------------------------------------------------

/// Cost totals derived from an itemized request, reported back with the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostItemsBreakdown {
    pub items: Vec<CostLineItem>,
    pub total_capex: Money,
    pub total_opex_year_one: Money,
}

/// Canonical inputs: every downstream stage reads this and nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedInputs {
    pub capacity_mw: Decimal,
    pub year_one_yield_mwh: Energy,
    pub capex_per_mw: Money,
    pub opex_per_mw_year: Money,
    pub total_capex: Money,
    pub total_opex_year_one: Money,
    pub ppa_price: Money,
    pub degradation_rate: Rate,
    pub ppa_escalation: Rate,
    pub opex_escalation: Rate,
    pub gearing_ratio: Rate,
    pub interest_rate: Rate,
    pub debt_tenor_years: u32,
    pub target_dscr: Multiple,
    pub project_lifetime_years: u32,
    pub tax_rate: Rate,
    pub discount_rate: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_items_breakdown: Option<CostItemsBreakdown>,
}

/// Resolve the cost shape and validate every parameter.
///
/// Itemized requests keep their summed totals as-is and derive the per-MW
/// figures from them; per-MW requests derive the totals from capacity.
pub fn normalize(input: &SolarProjectInput) -> PvFinanceResult<NormalizedInputs> {
    if input.capacity_mw <= Decimal::ZERO {
        return Err(PvFinanceError::invalid(
            "capacity_mw",
            "Capacity must be greater than 0",
        ));
    }
    if input.capacity_mw < MIN_CAPACITY_MW || input.capacity_mw > MAX_MAGNITUDE {
        return Err(PvFinanceError::invalid(
            "capacity_mw",
            format!("Capacity must be between {MIN_CAPACITY_MW} and {MAX_MAGNITUDE} MW"),
        ));
    }
    let capacity = input.capacity_mw;

    let (capex_per_mw, opex_per_mw_year, total_capex, total_opex_year_one, breakdown) =
        match input.cost_basis()? {
            CostBasis::Itemized(items) => {
                let mut total_capex = Decimal::ZERO;
                let mut total_opex = Decimal::ZERO;
                for item in &items {
                    let amount = checked_item_amount(item)?;
                    let total = if item.is_capex {
                        &mut total_capex
                    } else {
                        &mut total_opex
                    };
                    *total = total
                        .checked_add(amount)
                        .ok_or_else(|| PvFinanceError::invalid("cost_items", "Itemized total is out of range"))?;
                }

                if total_capex <= Decimal::ZERO {
                    return Err(PvFinanceError::NonPositiveCapex { total: total_capex });
                }
                if total_opex <= Decimal::ZERO {
                    return Err(PvFinanceError::NonPositiveOpex { total: total_opex });
                }

                (
                    total_capex / capacity,
                    total_opex / capacity,
                    total_capex,
                    total_opex,
                    Some(CostItemsBreakdown {
                        items,
                        total_capex,
                        total_opex_year_one: total_opex,
                    }),
                )
            }
            CostBasis::PerMw {
                capex_per_mw,
                opex_per_mw_year,
            } => {
                if capex_per_mw <= Decimal::ZERO {
                    return Err(PvFinanceError::invalid(
                        "capex_per_mw",
                        "CapEx per MW must be greater than 0",
                    ));
                }
                if opex_per_mw_year <= Decimal::ZERO {
                    return Err(PvFinanceError::invalid(
                        "opex_per_mw_year",
                        "OpEx per MW-year must be greater than 0",
                    ));
                }
                (
                    capex_per_mw,
                    opex_per_mw_year,
                    capacity
                        .checked_mul(capex_per_mw)
                        .ok_or_else(|| total_out_of_range("capex_per_mw"))?,
                    capacity
                        .checked_mul(opex_per_mw_year)
                        .ok_or_else(|| total_out_of_range("opex_per_mw_year"))?,
                    None,
                )
            }
        };

    if total_capex > MAX_MAGNITUDE {
        return Err(total_out_of_range("total_capex"));
    }
    if total_opex_year_one > MAX_MAGNITUDE {
        return Err(total_out_of_range("total_opex_year_one"));
    }

    validate_parameters(input)?;

    tracing::debug!(
        total_capex = %total_capex,
        total_opex_year_one = %total_opex_year_one,
        itemized = breakdown.is_some(),
        "normalized solar project inputs"
    );

    Ok(NormalizedInputs {
        capacity_mw: capacity,
        year_one_yield_mwh: input.year_one_yield_mwh,
        capex_per_mw,
        opex_per_mw_year,
        total_capex,
        total_opex_year_one,
        ppa_price: input.ppa_price,
        degradation_rate: input.degradation_rate,
        ppa_escalation: input.ppa_escalation,
        opex_escalation: input.opex_escalation,
        gearing_ratio: input.gearing_ratio,
        interest_rate: input.interest_rate,
        debt_tenor_years: input.debt_tenor_years,
        target_dscr: input.target_dscr,
        project_lifetime_years: input.project_lifetime_years,
        tax_rate: input.tax_rate,
        discount_rate: input.discount_rate,
        cost_items_breakdown: breakdown,
    })
}

const MAX_PROJECT_LIFETIME_YEARS: u32 = 50;
/// Ceiling on capacity and on year-one capex, opex and revenue. With rates
/// capped at 100% and 50 years, every projected sum stays below ~1e28.
const MAX_MAGNITUDE: Decimal = dec!(100_000_000_000);
/// 1 kW; keeps per-MW figures and the capacity factor in range.
const MIN_CAPACITY_MW: Decimal = dec!(0.001);

fn total_out_of_range(field: &str) -> PvFinanceError {
    PvFinanceError::invalid(field, format!("Cost total cannot exceed {MAX_MAGNITUDE}"))
}

/// Validate one itemized line and return its amount.
fn checked_item_amount(item: &CostLineItem) -> PvFinanceResult<Money> {
    if item.name.trim().is_empty() {
        return Err(PvFinanceError::invalid("cost_items", "Cost item name cannot be empty"));
    }
    let amount = item
        .effective_amount()
        .filter(|amount| *amount <= MAX_MAGNITUDE)
        .ok_or_else(|| {
            PvFinanceError::invalid(
                "cost_items",
                format!("'{}' amount cannot exceed {MAX_MAGNITUDE}", item.name),
            )
        })?;
    if amount <= Decimal::ZERO {
        return Err(PvFinanceError::invalid(
            "cost_items",
            format!("'{}' amount must be greater than 0", item.name),
        ));
    }
    Ok(amount)
}
const MAX_ANNUAL_RATE: Rate = Decimal::ONE;

/// Range checks on everything except capacity and costs.
fn validate_parameters(input: &SolarProjectInput) -> PvFinanceResult<()> {
    if input.year_one_yield_mwh <= Decimal::ZERO {
        return Err(PvFinanceError::invalid(
            "year_one_yield_mwh",
            "First-year energy yield must be greater than 0",
        ));
    }

    if input.ppa_price <= Decimal::ZERO {
        return Err(PvFinanceError::invalid(
            "ppa_price",
            "PPA price must be greater than 0",
        ));
    }

    if input.year_one_yield_mwh > MAX_MAGNITUDE {
        return Err(PvFinanceError::invalid(
            "year_one_yield_mwh",
            format!("First-year energy yield cannot exceed {MAX_MAGNITUDE} MWh"),
        ));
    }

    if input.ppa_price > MAX_MAGNITUDE {
        return Err(PvFinanceError::invalid(
            "ppa_price",
            format!("PPA price cannot exceed {MAX_MAGNITUDE}"),
        ));
    }

    let year_one_revenue = input.year_one_yield_mwh.checked_mul(input.ppa_price);
    if year_one_revenue.map_or(true, |revenue| revenue > MAX_MAGNITUDE) {
        return Err(PvFinanceError::invalid(
            "ppa_price",
            format!("First-year revenue (yield × PPA price) cannot exceed {MAX_MAGNITUDE}"),
        ));
    }

    if input.degradation_rate < Decimal::ZERO || input.degradation_rate >= Decimal::ONE {
        return Err(PvFinanceError::invalid(
            "degradation_rate",
            "Degradation rate must be in [0, 1)",
        ));
    }

    if input.ppa_escalation <= dec!(-1) || input.ppa_escalation > MAX_ANNUAL_RATE {
        return Err(PvFinanceError::invalid(
            "ppa_escalation",
            "PPA escalation must be in (-100%, 100%]",
        ));
    }

    if input.opex_escalation <= dec!(-1) || input.opex_escalation > MAX_ANNUAL_RATE {
        return Err(PvFinanceError::invalid(
            "opex_escalation",
            "OpEx escalation must be in (-100%, 100%]",
        ));
    }

    if input.gearing_ratio < Decimal::ZERO || input.gearing_ratio > Decimal::ONE {
        return Err(PvFinanceError::invalid(
            "gearing_ratio",
            "Gearing ratio must be in [0, 1]",
        ));
    }

    if input.interest_rate < Decimal::ZERO || input.interest_rate > MAX_ANNUAL_RATE {
        return Err(PvFinanceError::invalid(
            "interest_rate",
            "Interest rate must be in [0, 100%]",
        ));
    }

    if input.debt_tenor_years < 1 {
        return Err(PvFinanceError::invalid(
            "debt_tenor_years",
            "Debt tenor must be at least 1 year",
        ));
    }

    if input.target_dscr <= Decimal::ZERO {
        return Err(PvFinanceError::invalid(
            "target_dscr",
            "Target DSCR must be greater than 0",
        ));
    }

    if input.project_lifetime_years < input.debt_tenor_years {
        return Err(PvFinanceError::invalid(
            "project_lifetime_years",
            format!(
                "Project lifetime ({}) must be at least the debt tenor ({})",
                input.project_lifetime_years, input.debt_tenor_years
            ),
        ));
    }

    if input.project_lifetime_years > MAX_PROJECT_LIFETIME_YEARS {
        return Err(PvFinanceError::invalid(
            "project_lifetime_years",
            format!("Project lifetime cannot exceed {MAX_PROJECT_LIFETIME_YEARS} years"),
        ));
    }

    if input.tax_rate < Decimal::ZERO || input.tax_rate > Decimal::ONE {
        return Err(PvFinanceError::invalid(
            "tax_rate",
            "Tax rate must be in [0, 1]",
        ));
    }

    if input.discount_rate < Decimal::ZERO || input.discount_rate > MAX_ANNUAL_RATE {
        return Err(PvFinanceError::invalid(
            "discount_rate",
            "Discount rate must be in [0, 100%]",
        ));
    }

    Ok(())
}
