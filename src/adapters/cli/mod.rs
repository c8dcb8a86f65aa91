//! CLI Adapter
//!
//! Command-line interface for the RiskMetric engine.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{
    parse_price_pair, AssessCmd, BatchCmd, BoundsCmd, CliApp, Command, HistoryCmd, OverrideCmd,
    PriceCmd, RiskCmd, SymbolCmd,
};

use anyhow::Result;

/// Initialize the CLI application
pub fn init() -> CliApp {
    use clap::Parser;
    CliApp::parse()
}

/// Execute the CLI command
pub fn execute(app: CliApp) -> Result<()> {
    commands::execute(app)
}
