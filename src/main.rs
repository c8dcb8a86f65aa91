//! RiskMetric CLI
//!
//! Price/risk lookups and signal assessments from the command line.

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use riskmetric::adapters::cli;
use riskmetric::config::load_config;

fn main() -> Result<()> {
    // Load .env file if it exists (path overrides go here)
    dotenvy::dotenv().ok();

    let app = cli::init();
    // Config errors are reported by the command itself
    let config_level = load_config(&app.config).ok().map(|c| c.logging.level);
    init_logging(app.verbose, app.debug, config_level)?;

    cli::execute(app)
}

fn init_logging(verbose: bool, debug: bool, config_level: Option<String>) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config_level.as_deref().unwrap_or("warn")))
    };

    // stderr keeps --json output on stdout clean
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
