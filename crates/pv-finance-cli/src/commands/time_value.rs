use clap::Args;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use pv_finance_core::time_value::{self, DEFAULT_IRR_GUESS};
use pv_finance_core::types::{with_metadata, Money, Rate};

/// Arguments for IRR
#[derive(Args)]
pub struct IrrArgs {
    /// Cash flows from period 0 (comma-separated, e.g. "-100,30,40,50")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    pub cash_flows: Vec<Decimal>,

    /// Starting rate for the Newton-Raphson search
    #[arg(long)]
    pub guess: Option<Decimal>,
}

/// Arguments for NPV
#[derive(Args)]
pub struct NpvArgs {
    /// Discount rate per period (0.08 = 8%)
    #[arg(long, allow_hyphen_values = true)]
    pub rate: Decimal,

    /// Cash flows from period 0 (comma-separated)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    pub cash_flows: Vec<Decimal>,
}

/// Arguments for PMT
#[derive(Args)]
pub struct PmtArgs {
    /// Interest rate per period
    #[arg(long)]
    pub rate: Decimal,

    /// Number of periods
    #[arg(long)]
    pub nper: u32,

    /// Present value (amount borrowed)
    #[arg(long, allow_hyphen_values = true)]
    pub pv: Decimal,

    /// Future value left after the last payment
    #[arg(long, allow_hyphen_values = true)]
    pub fv: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize)]
struct IrrOutput {
    irr: Rate,
    iterations: u32,
    converged: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct NpvOutput {
    npv: Money,
}

#[derive(Debug, Serialize, Deserialize)]
struct PmtOutput {
    payment: Money,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let guess = args.guess.unwrap_or(DEFAULT_IRR_GUESS);
    let solution = time_value::solve_irr(&args.cash_flows, guess);

    let mut warnings = Vec::new();
    if !solution.converged {
        warnings.push(format!(
            "IRR did not converge after {} iterations; reporting last estimate",
            solution.iterations
        ));
    }

    let output = with_metadata(
        "Newton-Raphson IRR",
        &serde_json::json!({
            "periods": args.cash_flows.len(),
            "guess": guess.to_string(),
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        IrrOutput {
            irr: solution.rate,
            iterations: solution.iterations,
            converged: solution.converged,
        },
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_npv(args: NpvArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let npv = time_value::npv(args.rate, &args.cash_flows)?;
    let output = with_metadata(
        "Net present value, period 0 undiscounted",
        &serde_json::json!({
            "rate": args.rate.to_string(),
            "periods": args.cash_flows.len(),
        }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        NpvOutput { npv },
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_pmt(args: PmtArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let fv = args.fv.unwrap_or(Decimal::ZERO);
    let payment = time_value::pmt(args.rate, args.nper, args.pv, fv)?;
    let output = with_metadata(
        "Level annuity payment (end of period)",
        &serde_json::json!({
            "rate": args.rate.to_string(),
            "nper": args.nper,
            "pv": args.pv.to_string(),
            "fv": fv.to_string(),
        }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        PmtOutput { payment },
    );
    Ok(serde_json::to_value(output)?)
}
