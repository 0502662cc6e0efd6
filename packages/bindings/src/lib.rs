use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

use pv_finance_core::solar::{self, ModelOptions, SolarProjectInput};
use pv_finance_core::time_value::{self, DEFAULT_IRR_GUESS};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Rates cross the boundary as strings so no precision is lost to f64.
fn parse_rate(field: &str, value: &str) -> NapiResult<Decimal> {
    Decimal::from_str(value.trim())
        .map_err(|e| to_napi_error(format!("Invalid {field} '{value}': {e}")))
}

// ---------------------------------------------------------------------------
// Project model
// ---------------------------------------------------------------------------

#[napi]
pub fn model_solar_project(input_json: String, options_json: Option<String>) -> NapiResult<String> {
    let input: SolarProjectInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let options: ModelOptions = match options_json {
        Some(json) => serde_json::from_str(&json).map_err(to_napi_error)?,
        None => ModelOptions::default(),
    };
    let output = solar::model_solar_project(&input, &options).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn default_inputs() -> NapiResult<String> {
    serde_json::to_string(&SolarProjectInput::default()).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Time value primitives
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct IrrResult {
    irr: Decimal,
    iterations: u32,
    converged: bool,
}

#[napi]
pub fn irr(flows_json: String, guess: Option<String>) -> NapiResult<String> {
    let flows: Vec<Decimal> = serde_json::from_str(&flows_json).map_err(to_napi_error)?;
    let guess = match guess {
        Some(g) => parse_rate("guess", &g)?,
        None => DEFAULT_IRR_GUESS,
    };
    let solution = time_value::solve_irr(&flows, guess);
    serde_json::to_string(&IrrResult {
        irr: solution.rate,
        iterations: solution.iterations,
        converged: solution.converged,
    })
    .map_err(to_napi_error)
}

#[napi]
pub fn npv(rate: String, flows_json: String) -> NapiResult<String> {
    let rate = parse_rate("rate", &rate)?;
    let flows: Vec<Decimal> = serde_json::from_str(&flows_json).map_err(to_napi_error)?;
    let npv = time_value::npv(rate, &flows).map_err(to_napi_error)?;
    serde_json::to_string(&serde_json::json!({ "npv": npv })).map_err(to_napi_error)
}
