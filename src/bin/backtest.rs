//! Headless backtest runner.
//!
//! Replays an in-memory candle fixture through one or more parameter sets
//! and prints a per-run report. Suitable as a smoke test for the replay
//! core; a real deployment wires `InMemoryCandleStore` up to a historical
//! candle repository instead (out of scope for this crate).
//!
//! # Usage
//! ```sh
//! SIMULATION_START=2024-01-01T00:00:00Z SIMULATION_END=2024-01-01T01:00:00Z \
//!     cargo run --bin backtest -- --symbol BTCUSDT --fund-len 4
//! ```

use anyhow::{Context, Result};
use candle_replay::application::simulation::{ParameterSet, SimulationDriver};
use candle_replay::config::SimulationSettings;
use candle_replay::domain::ports::Account;
use candle_replay::domain::types::{Candle, Symbol, MINUTE_MS};
use candle_replay::infrastructure::candle_store::InMemoryCandleStore;
use candle_replay::infrastructure::mock_account::MockAccount;
use candle_replay::infrastructure::reporter::ConsoleReporter;
use clap::Parser;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Multi-stream chronological replay backtest runner", long_about = None)]
struct Cli {
    /// Symbol to replay, e.g. BTCUSDT
    #[arg(long, default_value = "BTCUSDT")]
    symbol: String,

    /// Length in characters of the fund currency suffix (e.g. 4 for USDT)
    #[arg(long, default_value_t = 4)]
    fund_len: usize,

    /// Starting reference-currency balance for the demo account
    #[arg(long, default_value = "10000")]
    starting_funds: Decimal,

    /// Label for this run, shown in the printed report
    #[arg(long, default_value = "default")]
    label: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(fmt_layer)
        .init();

    info!("candle-replay backtest {} starting...", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let settings = SimulationSettings::from_env().context("failed to load simulation settings")?;

    let symbol = Symbol::new(&cli.symbol, cli.fund_len);
    info!(symbol = %symbol, start = settings.start_ms(), end = settings.end_ms(), "configuration loaded");

    let store = build_demo_store(&symbol, settings.start_ms(), settings.end_ms());
    let reporter = Arc::new(ConsoleReporter::new());
    let driver = SimulationDriver::new(Arc::new(store), reporter, settings.pool_concurrency);

    let account: Arc<dyn Account> = Arc::new(MockAccount::new(
        cli.label.clone(),
        symbol.fund().to_string(),
        cli.starting_funds,
        vec![symbol],
    ));

    let set = ParameterSet {
        label: cli.label,
        accounts: vec![account],
        start_ms: settings.start_ms(),
        end_ms: settings.end_ms(),
        cache_candles: settings.cache_candles,
        active_query_limit: settings.active_query_limit,
    };

    let reports = driver.run_parameter_stream(vec![set]).await;
    for report in &reports {
        info!(label = %report.label, candles_processed = report.candles_processed, "run finished");
    }

    Ok(())
}

/// Builds a one-minute-spaced candle fixture covering `[start_ms, end_ms]`
/// for `symbol`, standing in for a real historical repository.
fn build_demo_store(symbol: &Symbol, start_ms: i64, end_ms: i64) -> InMemoryCandleStore {
    let mut candles = Vec::new();
    let mut t = start_ms;
    while t <= end_ms {
        candles.push(Candle::at(t));
        t += MINUTE_MS;
    }
    let mut map = HashMap::new();
    map.insert(symbol.clone(), candles);
    InMemoryCandleStore::new(map)
}
