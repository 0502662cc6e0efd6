mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::model::ModelArgs;
use commands::time_value::{IrrArgs, NpvArgs, PmtArgs};

/// Utility-scale solar project finance
#[derive(Parser)]
#[command(
    name = "pvf",
    version,
    about = "Utility-scale solar project finance",
    long_about = "A CLI for modelling the bankability of utility-scale solar projects \
                  with decimal precision. Sizes senior debt against DSCR and gearing \
                  limits and reports project/equity IRR, LCOE, DSCR and payback."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log each model stage to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full project finance model from a JSON input
    Model(ModelArgs),
    /// Print the default (300 MW reference) project input
    Defaults,
    /// Internal rate of return of a cash-flow series
    Irr(IrrArgs),
    /// Net present value of a cash-flow series
    Npv(NpvArgs),
    /// Level annuity payment
    Pmt(PmtArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("pv_finance_core=debug,pv_finance_cli=debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    // stdout carries the result; logs must not interleave with it.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Model(args) => commands::model::run_model(args),
        Commands::Defaults => commands::model::run_defaults(),
        Commands::Irr(args) => commands::time_value::run_irr(args),
        Commands::Npv(args) => commands::time_value::run_npv(args),
        Commands::Pmt(args) => commands::time_value::run_pmt(args),
        Commands::Version => {
            println!("pvf {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
