//! Hotel surge analysis CLI.
//! Runs step 1 (analysis parameters) and, when a market price is given,
//! step 2 (final surge report). Prints JSON to stdout.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use hotel_surge_analyzer::workflow::{MarketData, SurgeAnalyzer};
use hotel_surge_analyzer::{load_config_default, load_config_from};
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "hotel-surge", version, about = "Explain hotel price surges for a stay")]
struct Cli {
    /// City name, e.g. "Berlin".
    #[arg(long)]
    city: String,

    /// ISO 3166-1 alpha-2 country code, e.g. "DE".
    #[arg(long)]
    country: String,

    /// First night, YYYY-MM-DD.
    #[arg(long)]
    check_in: NaiveDate,

    /// Departure day, YYYY-MM-DD.
    #[arg(long)]
    check_out: NaiveDate,

    /// Event search radius; defaults to the configured radius.
    #[arg(long)]
    radius_km: Option<u32>,

    /// Current average nightly price. Without it only step 1 runs.
    #[arg(long)]
    current_price: Option<f64>,

    /// Override the estimated baseline price.
    #[arg(long)]
    baseline_price: Option<f64>,

    #[arg(long)]
    currency: Option<String>,

    /// Calculation mode label recorded in the report.
    #[arg(long)]
    mode: Option<String>,

    /// Config file (TOML or JSON); otherwise $SURGE_CONFIG_PATH or config/surge.*.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

/// Logs go to stderr so stdout stays valid JSON.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hotel_surge_analyzer=info,ingest=info,warn"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let cfg = match &cli.config {
        Some(p) => load_config_from(p)?,
        None => load_config_default()?,
    };
    let analyzer = SurgeAnalyzer::from_config(&cfg)?;

    let params = analyzer
        .get_analysis_parameters(
            &cli.city,
            &cli.country,
            cli.check_in,
            cli.check_out,
            cli.radius_km,
        )
        .await?;

    let out = match cli.current_price {
        None => serde_json::to_value(&params)?,
        Some(price) => {
            let market = MarketData {
                average_price: price,
                currency: cli.currency.clone(),
            };
            let report = analyzer.calculate_final_surge(
                &params,
                &market,
                cli.baseline_price,
                cli.mode.as_deref(),
            )?;
            json!({
                "analysis_parameters": params,
                "surge_report": report,
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
