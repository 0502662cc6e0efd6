//! Utility-scale solar bankability model.
//!
//! Inputs are normalised into a single cost basis, projected year by year,
//! financed against DSCR and gearing limits, then scored.

pub mod assessment;
pub mod debt;
pub mod inputs;
pub mod projection;
pub mod returns;
pub mod seasonality;
pub mod summary;

pub use assessment::{assess, Assessment, Rating, Recommendation};
pub use debt::{BindingConstraint, FinancingStructure, YearlySeries};
pub use inputs::{normalize, CostBasis, CostLineItem, NormalizedInputs, SolarProjectInput};
pub use projection::{MonthlyOperations, OperatingCashFlows, YearlyOperations};
pub use returns::KeyMetrics;
pub use seasonality::SeasonalProfile;
pub use summary::{model_solar_project, ModelOptions, ProjectSummary, SolarProjectReport};
