//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the RiskMetric engine.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::adapters::persistence::{BoundsOverride, BoundsOverrideFile, JsonlAssessmentLog};
use crate::application::{apply_overrides, build_store, Assessor};
use crate::config::{load_config, Config};
use crate::domain::bands::RiskBand;
use crate::domain::bounds::normalize_symbol;
use crate::domain::store::RiskMetricStore;
use crate::ports::AssessmentLog;

/// RiskMetric - log-linear risk curves and time-in-band signal scoring
#[derive(Parser, Debug)]
#[command(
    name = "riskmetric",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Log-linear risk curves and time-in-band signal scoring",
    long_about = "RiskMetric maps an asset's price onto a 0-1 risk scale between configured \
                  bounds, weights it by how rarely the asset visits that risk band, and \
                  derives a Strong Buy .. Strong Sell signal with a numeric score."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE", default_value = "config/riskmetric.toml")]
    pub config: PathBuf,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Assess a symbol at a price and record it in the history
    Assess(AssessCmd),

    /// Assess several symbols; failures do not stop the batch
    Batch(BatchCmd),

    /// Convert a price to risk
    Risk(RiskCmd),

    /// Convert a risk value to price
    Price(PriceCmd),

    /// Print a symbol's risk lookup table
    Table(SymbolCmd),

    /// Print a symbol's time-in-band data and coefficients
    Bands(SymbolCmd),

    /// Print configured bounds
    Bounds(BoundsCmd),

    /// Show recorded assessments
    History(HistoryCmd),

    /// Manually override a symbol's bounds
    Override(OverrideCmd),
}

/// Assess one symbol
#[derive(Args, Debug)]
pub struct AssessCmd {
    /// Symbol (e.g., BTC)
    #[arg(value_name = "SYMBOL", value_parser = parse_symbol)]
    pub symbol: String,

    /// Current price
    #[arg(value_name = "PRICE")]
    pub price: f64,

    /// Compute without recording in the history
    #[arg(long)]
    pub dry_run: bool,
}

/// Assess many symbols
#[derive(Args, Debug)]
pub struct BatchCmd {
    /// SYMBOL=PRICE pairs (e.g., BTC=114222 ETH=2500)
    #[arg(value_name = "SYMBOL=PRICE", required = true, value_parser = parse_price_pair)]
    pub pairs: Vec<(String, f64)>,
}

/// Price -> risk
#[derive(Args, Debug)]
pub struct RiskCmd {
    #[arg(value_name = "SYMBOL", value_parser = parse_symbol)]
    pub symbol: String,

    #[arg(value_name = "PRICE")]
    pub price: f64,
}

/// Risk -> price
#[derive(Args, Debug)]
pub struct PriceCmd {
    #[arg(value_name = "SYMBOL", value_parser = parse_symbol)]
    pub symbol: String,

    /// Risk in [0, 1]
    #[arg(value_name = "RISK")]
    pub risk: f64,
}

/// Commands taking a single symbol
#[derive(Args, Debug)]
pub struct SymbolCmd {
    #[arg(value_name = "SYMBOL", value_parser = parse_symbol)]
    pub symbol: String,
}

/// Show bounds
#[derive(Args, Debug)]
pub struct BoundsCmd {
    /// Only this symbol (all symbols if omitted)
    #[arg(value_name = "SYMBOL", value_parser = parse_symbol)]
    pub symbol: Option<String>,
}

/// Show history
#[derive(Args, Debug)]
pub struct HistoryCmd {
    /// Only this symbol
    #[arg(short, long, value_name = "SYMBOL", value_parser = parse_symbol)]
    pub symbol: Option<String>,

    /// Show only the most recent N entries
    #[arg(short = 'n', long, value_name = "N")]
    pub limit: Option<usize>,
}

/// Override bounds
#[derive(Args, Debug)]
pub struct OverrideCmd {
    #[arg(value_name = "SYMBOL", value_parser = parse_symbol)]
    pub symbol: String,

    /// New minimum price
    #[arg(long, value_name = "PRICE", required_unless_present = "clear")]
    pub min: Option<f64>,

    /// New maximum price
    #[arg(long, value_name = "PRICE", required_unless_present = "clear")]
    pub max: Option<f64>,

    /// Remove the persisted override and fall back to configured bounds
    #[arg(long, conflicts_with_all = ["min", "max"])]
    pub clear: bool,
}

/// Normalize a symbol argument (" btc" -> "BTC")
pub fn parse_symbol(s: &str) -> Result<String, String> {
    let symbol = normalize_symbol(s);
    if symbol.is_empty() {
        return Err("symbol must not be empty".to_string());
    }
    Ok(symbol)
}

/// Parse "btc=114222" into ("BTC", 114222.0)
pub fn parse_price_pair(s: &str) -> Result<(String, f64), String> {
    let (symbol, price) = s
        .split_once('=')
        .ok_or_else(|| format!("expected SYMBOL=PRICE, got '{}'", s))?;

    let symbol = normalize_symbol(symbol);
    if symbol.is_empty() {
        return Err(format!("missing symbol in '{}'", s));
    }

    let price: f64 = price
        .trim()
        .parse()
        .map_err(|_| format!("invalid price in '{}'", s))?;

    Ok((symbol, price))
}

/// Execute the parsed command
pub fn execute(app: CliApp) -> Result<()> {
    let config = load_config(&app.config)
        .with_context(|| format!("Failed to load configuration from {}", app.config.display()))?;

    match app.command {
        Command::Assess(cmd) => assess_command(&config, cmd, app.json),
        Command::Batch(cmd) => batch_command(&config, cmd, app.json),
        Command::Risk(cmd) => risk_command(&config, cmd, app.json),
        Command::Price(cmd) => price_command(&config, cmd, app.json),
        Command::Table(cmd) => table_command(&config, cmd, app.json),
        Command::Bands(cmd) => bands_command(&config, cmd, app.json),
        Command::Bounds(cmd) => bounds_command(&config, cmd, app.json),
        Command::History(cmd) => history_command(&config, cmd, app.json),
        Command::Override(cmd) => override_command(&config, cmd),
    }
}

/// Store from config with persisted overrides applied
fn load_store(config: &Config) -> Result<RiskMetricStore> {
    let mut store = build_store(config).context("Invalid symbol configuration")?;

    let overrides_path = config.storage.get_overrides_path();
    let overrides = BoundsOverrideFile::load(&overrides_path)
        .with_context(|| format!("Failed to load overrides from {}", overrides_path.display()))?;
    apply_overrides(&mut store, &overrides).context("Invalid persisted bounds override")?;

    Ok(store)
}

fn assessor(config: &Config) -> Result<Assessor<JsonlAssessmentLog>> {
    let store = load_store(config)?;
    let log = JsonlAssessmentLog::new(config.storage.get_history_path());
    Ok(Assessor::new(store, log))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn assess_command(config: &Config, cmd: AssessCmd, json: bool) -> Result<()> {
    let assessor = assessor(config)?;
    let assessment = if cmd.dry_run {
        assessor.evaluate(&cmd.symbol, cmd.price)?
    } else {
        assessor.assess(&cmd.symbol, cmd.price)?
    };

    if json {
        return print_json(&assessment);
    }
    println!("{}", assessment.summary());
    Ok(())
}

#[derive(Serialize)]
struct BatchLine<'a> {
    symbol: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    assessment: Option<&'a crate::domain::Assessment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<&'static str>,
}

fn batch_command(config: &Config, cmd: BatchCmd, json: bool) -> Result<()> {
    let assessor = assessor(config)?;
    let results = assessor.assess_batch(&cmd.pairs);

    if json {
        let lines: Vec<BatchLine> = results
            .iter()
            .map(|r| match &r.outcome {
                Ok(a) => BatchLine {
                    symbol: &r.symbol,
                    assessment: Some(a),
                    error: None,
                    error_kind: None,
                },
                Err(e) => BatchLine {
                    symbol: &r.symbol,
                    assessment: None,
                    error: Some(e.to_string()),
                    error_kind: Some(e.kind()),
                },
            })
            .collect();
        return print_json(&lines);
    }

    for result in &results {
        match &result.outcome {
            Ok(a) => println!("{}", a.summary()),
            Err(e) => println!("{}: ERROR {}", result.symbol, e),
        }
    }
    let failed = results.iter().filter(|r| !r.is_ok()).count();
    println!("{} assessed, {} failed", results.len() - failed, failed);
    Ok(())
}

fn risk_command(config: &Config, cmd: RiskCmd, json: bool) -> Result<()> {
    let store = load_store(config)?;
    let risk = store.risk_from_price(&cmd.symbol, cmd.price)?;

    if json {
        return print_json(&serde_json::json!({
            "symbol": cmd.symbol,
            "price": cmd.price,
            "risk": risk,
            "risk_band": RiskBand::containing(risk).to_string(),
        }));
    }
    println!(
        "{} @ {:.4} -> risk {:.4} (band {})",
        cmd.symbol,
        cmd.price,
        risk,
        RiskBand::containing(risk)
    );
    Ok(())
}

fn price_command(config: &Config, cmd: PriceCmd, json: bool) -> Result<()> {
    let store = load_store(config)?;
    let price = store.price_from_risk(&cmd.symbol, cmd.risk)?;

    if json {
        return print_json(&serde_json::json!({
            "symbol": cmd.symbol,
            "risk": cmd.risk,
            "price": price,
        }));
    }
    println!("{} risk {:.4} -> price {:.4}", cmd.symbol, cmd.risk, price);
    Ok(())
}

fn table_command(config: &Config, cmd: SymbolCmd, json: bool) -> Result<()> {
    let store = load_store(config)?;
    let curve = store.risk_table(&cmd.symbol)?;

    if json {
        return print_json(curve);
    }
    println!("{:>8}  {:>16}", "risk", "price");
    for point in curve.points() {
        println!("{:>8.4}  {:>16.4}", point.risk, point.price);
    }
    Ok(())
}

fn bands_command(config: &Config, cmd: SymbolCmd, json: bool) -> Result<()> {
    let store = load_store(config)?;
    let table = store.band_table(&cmd.symbol)?;

    if json {
        return print_json(table);
    }

    let coefficients = table.coefficients().ok();
    println!("{:>9}  {:>8}  {:>11}", "band", "time %", "coefficient");
    for band in RiskBand::all() {
        let coefficient = coefficients
            .map(|c| format!("{:.4}", c[band.index()]))
            .unwrap_or_else(|| "n/a".to_string());
        println!("{:>9}  {:>8.2}  {:>11}", band.to_string(), table.percentage(band), coefficient);
    }
    println!("total {:.2}%", table.total_percentage());
    Ok(())
}

fn bounds_command(config: &Config, cmd: BoundsCmd, json: bool) -> Result<()> {
    let store = load_store(config)?;
    let symbols = match cmd.symbol {
        Some(symbol) => vec![symbol],
        None => store.symbols(),
    };

    let bounds = symbols
        .iter()
        .map(|s| store.get_bounds(s).cloned())
        .collect::<Result<Vec<_>, _>>()?;

    if json {
        return print_json(&bounds);
    }
    for b in &bounds {
        println!("{:<8} {:>16.4} -> {:<16.4} ({:.1}x)", b.symbol, b.min_price, b.max_price, b.range_multiple());
    }
    Ok(())
}

fn history_command(config: &Config, cmd: HistoryCmd, json: bool) -> Result<()> {
    let path = config.storage.get_history_path();
    let log = JsonlAssessmentLog::new(&path);
    let mut entries = log
        .read_all()
        .with_context(|| format!("Failed to read history from {}", path.display()))?;

    if let Some(ref symbol) = cmd.symbol {
        entries.retain(|a| &a.symbol == symbol);
    }
    if let Some(limit) = cmd.limit {
        let skip = entries.len().saturating_sub(limit);
        entries = entries.split_off(skip);
    }

    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No assessments recorded in {}", path.display());
        return Ok(());
    }
    for a in &entries {
        println!("{}  {}", a.timestamp.format("%Y-%m-%d %H:%M:%S"), a.summary());
    }
    Ok(())
}

fn override_command(config: &Config, cmd: OverrideCmd) -> Result<()> {
    let path = config.storage.get_overrides_path();
    let mut overrides = BoundsOverrideFile::load(&path)?;

    if cmd.clear {
        match overrides.remove(&cmd.symbol) {
            Some(_) => {
                save_overrides(&overrides, &path)?;
                println!("Override for {} cleared", cmd.symbol);
            }
            None => println!("No override recorded for {}", cmd.symbol),
        }
        return Ok(());
    }

    let (Some(min), Some(max)) = (cmd.min, cmd.max) else {
        bail!("--min and --max are both required unless --clear is given");
    };

    // Validate against the configured symbol and its anchor before persisting
    let mut store = build_store(config).context("Invalid symbol configuration")?;
    store
        .override_bounds(&cmd.symbol, min, max)
        .with_context(|| format!("Override rejected for {}", cmd.symbol))?;

    overrides.upsert(BoundsOverride::new(&cmd.symbol, min, max));
    save_overrides(&overrides, &path)?;

    println!(
        "Override saved: {} {:.4} -> {:.4}",
        cmd.symbol,
        min,
        max
    );
    Ok(())
}

fn save_overrides(overrides: &BoundsOverrideFile, path: &Path) -> Result<()> {
    overrides
        .save(path)
        .with_context(|| format!("Failed to save overrides to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_pair() {
        assert_eq!(parse_price_pair("BTC=114222").unwrap(), ("BTC".to_string(), 114_222.0));
        assert_eq!(parse_price_pair(" eth = 2500.5 ").unwrap(), ("ETH".to_string(), 2_500.5));
        assert!(parse_price_pair("BTC").is_err());
        assert!(parse_price_pair("=100").is_err());
        assert!(parse_price_pair("BTC=abc").is_err());
    }

    #[test]
    fn test_cli_parses_batch() {
        let app = CliApp::try_parse_from(["riskmetric", "batch", "BTC=114222", "ETH=2500", "--json"])
            .unwrap();
        assert!(app.json);
        match app.command {
            Command::Batch(cmd) => assert_eq!(cmd.pairs.len(), 2),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_override_requires_bounds_or_clear() {
        assert!(CliApp::try_parse_from(["riskmetric", "override", "BTC"]).is_err());
        assert!(CliApp::try_parse_from(["riskmetric", "override", "BTC", "--clear"]).is_ok());
        assert!(CliApp::try_parse_from([
            "riskmetric", "override", "BTC", "--min", "1", "--max", "2"
        ])
        .is_ok());
        assert!(CliApp::try_parse_from([
            "riskmetric", "override", "BTC", "--min", "1", "--clear"
        ])
        .is_err());
    }

    #[test]
    fn test_cli_normalizes_symbols() {
        let app = CliApp::try_parse_from(["riskmetric", "risk", " btc ", "50000"]).unwrap();
        match app.command {
            Command::Risk(cmd) => assert_eq!(cmd.symbol, "BTC"),
            other => panic!("unexpected command {:?}", other),
        }

        let app = CliApp::try_parse_from(["riskmetric", "price", "eth", "0.5"]).unwrap();
        match app.command {
            Command::Price(cmd) => assert_eq!(cmd.symbol, "ETH"),
            other => panic!("unexpected command {:?}", other),
        }

        let app = CliApp::try_parse_from(["riskmetric", "history", "-s", "sol"]).unwrap();
        match app.command {
            Command::History(cmd) => assert_eq!(cmd.symbol.as_deref(), Some("SOL")),
            other => panic!("unexpected command {:?}", other),
        }

        assert!(CliApp::try_parse_from(["riskmetric", "table", "  "]).is_err());
    }

    #[test]
    fn test_default_config_path() {
        let app = CliApp::try_parse_from(["riskmetric", "table", "BTC"]).unwrap();
        assert_eq!(app.config, PathBuf::from("config/riskmetric.toml"));
    }
}
