use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PvFinanceError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Missing cost basis: provide cost_items or both capex_per_mw and opex_per_mw_year")]
    MissingCostBasis,

    #[error("Total CapEx must be greater than 0 (itemized total: {total})")]
    NonPositiveCapex { total: Decimal },

    #[error("Total OpEx must be greater than 0 (itemized total: {total})")]
    NonPositiveOpex { total: Decimal },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Arithmetic out of decimal range in {context}")]
    ArithmeticOverflow { context: String },
}

impl PvFinanceError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        PvFinanceError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn overflow(context: impl Into<String>) -> Self {
        PvFinanceError::ArithmeticOverflow {
            context: context.into(),
        }
    }
}
