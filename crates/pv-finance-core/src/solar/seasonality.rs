use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PvFinanceError;
use crate::PvFinanceResult;

/// Short month labels, January first.
pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// How far the weights may drift from summing to exactly 1.
const WEIGHT_SUM_TOLERANCE: Decimal = dec!(0.000000001);

/// Share of annual energy produced in each calendar month.
///
/// Immutable once built; passed into the model rather than read from a
/// global so that southern-hemisphere or site-specific shapes can be used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Decimal>", into = "Vec<Decimal>")]
pub struct SeasonalProfile {
    weights: [Decimal; 12],
}

impl SeasonalProfile {
    /// Build a profile from twelve non-negative weights summing to 1.
    pub fn new(weights: [Decimal; 12]) -> PvFinanceResult<Self> {
        if let Some(month) = weights.iter().position(|w| *w < Decimal::ZERO) {
            return Err(PvFinanceError::InvalidInput {
                field: "seasonal_profile".into(),
                reason: format!("Weight for {} is negative", MONTH_NAMES[month]),
            });
        }

        let total: Decimal = weights.iter().sum();
        if (total - Decimal::ONE).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(PvFinanceError::InvalidInput {
                field: "seasonal_profile".into(),
                reason: format!("Monthly weights must sum to 1.0, got {total}"),
            });
        }

        Ok(SeasonalProfile { weights })
    }

    pub fn weights(&self) -> &[Decimal; 12] {
        &self.weights
    }

    /// Weight for a 1-based month.
    pub fn weight(&self, month: u32) -> Decimal {
        self.weights[(month as usize - 1) % 12]
    }
}

impl Default for SeasonalProfile {
    /// Northern-hemisphere solar shape, peaking in July.
    fn default() -> Self {
        SeasonalProfile {
            weights: [
                dec!(0.04),
                dec!(0.05),
                dec!(0.08),
                dec!(0.10),
                dec!(0.12),
                dec!(0.12),
                dec!(0.13),
                dec!(0.11),
                dec!(0.09),
                dec!(0.07),
                dec!(0.05),
                dec!(0.04),
            ],
        }
    }
}

impl TryFrom<Vec<Decimal>> for SeasonalProfile {
    type Error = PvFinanceError;

    fn try_from(values: Vec<Decimal>) -> Result<Self, Self::Error> {
        let weights: [Decimal; 12] =
            values
                .try_into()
                .map_err(|v: Vec<Decimal>| PvFinanceError::InvalidInput {
                    field: "seasonal_profile".into(),
                    reason: format!("Expected 12 monthly weights, got {}", v.len()),
                })?;
        SeasonalProfile::new(weights)
    }
}

impl From<SeasonalProfile> for Vec<Decimal> {
    fn from(profile: SeasonalProfile) -> Self {
        profile.weights.to_vec()
    }
}
