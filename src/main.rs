//! Surebet scanner entry point.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use surebet::arbitrage::scan;
use surebet::config::Config;
use surebet::market::{consolidate, demo_feeds, SourceFeed};
use surebet::metrics;
use surebet::{DetectionReport, SurebetError};

/// Multi-bookmaker surebet scanner.
#[derive(Parser, Debug)]
#[command(name = "surebet")]
#[command(about = "Detect arbitrage (surebet) opportunities across bookmaker odds")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Overrides shared by the detection commands.
#[derive(clap::Args, Debug, Default)]
struct DetectionArgs {
    /// Total stake to split across each surebet.
    #[arg(long)]
    stake: Option<Decimal>,

    /// Minimum margin in percent.
    #[arg(long)]
    min_margin: Option<Decimal>,

    /// Maximum plausible margin in percent.
    #[arg(long)]
    max_margin: Option<Decimal>,

    /// Print the full detection report as JSON.
    #[arg(long)]
    json: bool,

    /// Print Prometheus metrics to stderr after the pass.
    #[arg(long)]
    metrics: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a JSON file of per-bookmaker feeds.
    Scan {
        /// Path to a JSON array of source feeds.
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        detection: DetectionArgs,
    },

    /// Scan the built-in four-bookmaker sample (default).
    Demo {
        #[command(flatten)]
        detection: DetectionArgs,
    },

    /// Check configuration validity.
    CheckConfig,
}

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("surebet=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match args.command {
        Some(Command::Scan { input, detection }) => {
            let feeds = read_feeds(&input)?;
            cmd_detect(feeds, &detection)
        }
        Some(Command::Demo { detection }) => cmd_detect(demo_feeds(), &detection),
        Some(Command::CheckConfig) => cmd_check_config(),
        None => cmd_detect(demo_feeds(), &DetectionArgs::default()),
    }
}

/// Load feeds from a JSON file.
fn read_feeds(path: &Path) -> surebet::Result<Vec<SourceFeed>> {
    let raw = fs::read_to_string(path)?;
    let feeds: Vec<SourceFeed> = serde_json::from_str(&raw)?;
    info!(path = %path.display(), sources = feeds.len(), "Loaded source feeds");
    Ok(feeds)
}

/// Load configuration and apply command-line overrides.
fn load_config(overrides: &DetectionArgs) -> surebet::Result<Config> {
    let mut config = Config::load()?;

    if let Some(stake) = overrides.stake {
        config.total_stake = stake;
    }
    if let Some(min) = overrides.min_margin {
        config.min_margin = min;
    }
    if let Some(max) = overrides.max_margin {
        config.max_margin = max;
    }

    config.validate().map_err(SurebetError::InvalidConfig)?;
    Ok(config)
}

/// Consolidate feeds, run one detection pass and print the outcome.
fn cmd_detect(feeds: Vec<SourceFeed>, detection: &DetectionArgs) -> anyhow::Result<()> {
    let config = load_config(detection).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    let prometheus = if detection.metrics {
        Some(metrics::install_prometheus()?)
    } else {
        None
    };

    let events = consolidate(feeds);
    info!(events = events.len(), "Analyzing arbitrage opportunities");

    let report = scan(&events, &config.detector_config()?)?;

    if detection.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &config);
    }

    if let Some(handle) = prometheus {
        eprintln!("{}", handle.render());
    }

    Ok(())
}

fn print_report(report: &DetectionReport, config: &Config) {
    println!("======================================================================");
    println!("SUREBET SCAN - {} markets evaluated", report.markets_evaluated());
    println!("======================================================================");

    if report.opportunities.is_empty() {
        println!(
            "No surebets found with margin between {}% and {}%",
            config.min_margin, config.max_margin
        );
    }

    for opportunity in &report.opportunities {
        println!("{}", opportunity.display_with(config.stake_decimals));
        let spread = opportunity.return_spread(config.stake_decimals);
        if !spread.is_zero() {
            println!(
                "  rounding to {} places moves returns by up to ${}",
                config.stake_decimals, spread
            );
        }
        println!("----------------------------------------------------------------------");
    }

    if !report.skipped.is_empty() {
        println!("Skipped markets:");
        for skipped in &report.skipped {
            println!("  - {} | {}: {}", skipped.event, skipped.market, skipped.reason);
        }
    }
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("SUREBET - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    let cap = config
        .max_stake_per_source
        .map(|c| format!("${c}"))
        .unwrap_or_else(|| "none".to_string());

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Total Stake: ${}", config.total_stake);
    println!("  Margin Range: {}% - {}%", config.min_margin, config.max_margin);
    println!("  Odds Window: {} - {}", config.min_odds, config.max_odds);
    println!("  Max Stake Per Bookmaker: {}", cap);
    println!("  Stake Decimals: {}", config.stake_decimals);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_scan_overrides() {
        let args = Args::parse_from([
            "surebet",
            "scan",
            "--input",
            "feeds.json",
            "--stake",
            "5000",
            "--min-margin",
            "0.5",
            "--json",
        ]);

        match args.command {
            Some(Command::Scan { input, detection }) => {
                assert_eq!(input, PathBuf::from("feeds.json"));
                assert_eq!(detection.stake, Some(Decimal::new(5000, 0)));
                assert_eq!(detection.min_margin, Some(Decimal::new(5, 1)));
                assert!(detection.json);
                assert!(!detection.metrics);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_defaults_to_no_subcommand() {
        let args = Args::parse_from(["surebet", "-v"]);
        assert!(args.verbose);
        assert!(args.command.is_none());
    }
}
