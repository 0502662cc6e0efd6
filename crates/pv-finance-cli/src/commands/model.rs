use clap::Args;
use serde_json::Value;

use pv_finance_core::solar::{self, ModelOptions, SeasonalProfile, SolarProjectInput};

use crate::input;

/// Arguments for the project finance model
#[derive(Args)]
pub struct ModelArgs {
    /// Path to JSON project input (reads piped stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Include the monthly breakdown
    #[arg(long)]
    pub monthly: bool,

    /// Omit the yearly series
    #[arg(long)]
    pub no_yearly: bool,

    /// Path to a JSON array of 12 monthly energy weights summing to 1
    #[arg(long)]
    pub seasonal_profile: Option<String>,
}

pub fn run_model(args: ModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let project: SolarProjectInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for the project model".into());
    };

    let seasonal_profile: SeasonalProfile = match args.seasonal_profile {
        Some(ref path) => input::file::read_json(path)?,
        None => SeasonalProfile::default(),
    };

    let options = ModelOptions {
        include_yearly: !args.no_yearly,
        include_monthly: args.monthly,
        seasonal_profile,
    };

    tracing::debug!(
        project = project.project_name.as_deref().unwrap_or("unnamed"),
        monthly = options.include_monthly,
        "running project model"
    );

    let result = solar::model_solar_project(&project, &options)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_defaults() -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(SolarProjectInput::default())?)
}
