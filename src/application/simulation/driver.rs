//! `SimulationDriver` — the outer, per-parameter-set orchestration: reset
//! balances, build engines, load streams, run the dispatch loop, liquidate,
//! report.

use crate::application::replay::{build_readers, SymbolHandlers};
use crate::application::replay::stream_loader::StreamLoader;
use crate::domain::errors::ReplayError;
use crate::domain::ports::{Account, CandleStore, Reporter, TradingManager};
use crate::domain::types::Symbol;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// One parameter-set snapshot: the accounts to trade (already built and
/// parameterized by the caller — strategy construction is outside the
/// replay core's scope) and the time bounds to replay them over.
pub struct ParameterSet {
    pub label: String,
    pub accounts: Vec<Arc<dyn Account>>,
    pub start_ms: i64,
    pub end_ms: i64,
    pub cache_candles: bool,
    pub active_query_limit: usize,
}

/// Outcome of one parameter set's run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub label: String,
    pub candles_processed: u64,
}

pub struct SimulationDriver {
    loader: StreamLoader,
    reporter: Arc<dyn Reporter>,
}

impl SimulationDriver {
    pub fn new(store: Arc<dyn CandleStore>, reporter: Arc<dyn Reporter>, pool_concurrency: usize) -> Self {
        Self {
            loader: StreamLoader::new(store, pool_concurrency),
            reporter,
        }
    }

    /// Runs every parameter set in `sets` sequentially. A set whose dispatch
    /// loop fails (engine failure, empty replay) is logged and skipped; the
    /// rest of the stream still runs. Per-run state is discarded between
    /// sets — nothing here is shared across iterations.
    pub async fn run_parameter_stream(
        &self,
        sets: impl IntoIterator<Item = ParameterSet>,
    ) -> Vec<RunReport> {
        let mut reports = Vec::new();
        for set in sets {
            match self.run_one(&set).await {
                Ok(report) => reports.push(report),
                Err(err) => {
                    error!(label = %set.label, error = %err, "parameter set aborted");
                }
            }
        }
        reports
    }

    #[instrument(skip(self, set), fields(label = %set.label))]
    async fn run_one(&self, set: &ParameterSet) -> Result<RunReport, ReplayError> {
        for account in &set.accounts {
            account
                .reset_balances()
                .map_err(|source| ReplayError::EngineFailure {
                    symbol: account.client_id(),
                    open_time: set.start_ms,
                    source,
                })?;
        }

        let handlers = build_symbol_handlers(&set.accounts);
        let symbols: Vec<Symbol> = handlers.keys().cloned().collect();

        info!(symbols = symbols.len(), "loading candle streams");
        let sources = self
            .loader
            .load(
                &symbols,
                set.start_ms,
                set.end_ms,
                set.cache_candles,
                set.active_query_limit,
            )
            .await;

        let readers = build_readers(sources, handlers);
        let candles_processed =
            crate::application::replay::dispatch_loop::run(readers, set.start_ms, set.end_ms)?;

        for account in &set.accounts {
            for manager in account.all_trading_managers() {
                manager
                    .liquidate_open_positions()
                    .map_err(|source| ReplayError::EngineFailure {
                        symbol: manager.symbol().key().to_string(),
                        open_time: set.end_ms,
                        source,
                    })?;
            }
            self.reporter
                .report(account.as_ref())
                .map_err(|source| ReplayError::EngineFailure {
                    symbol: account.client_id(),
                    open_time: set.end_ms,
                    source,
                })?;
        }

        Ok(RunReport {
            label: set.label.clone(),
            candles_processed,
        })
    }
}

/// Builds `SymbolHandlers` from every account's configured symbol pairs and
/// trading managers. Symbols where asset equals fund carry no trade and are
/// skipped (design §3).
fn build_symbol_handlers(accounts: &[Arc<dyn Account>]) -> SymbolHandlers {
    let mut handlers: SymbolHandlers = SymbolHandlers::new();

    for account in accounts {
        let pairs = account.symbol_pairs();
        for manager in account.all_trading_managers() {
            let symbol = manager.symbol();
            let Some((asset, fund)) = pairs.get(symbol) else {
                continue;
            };
            if asset == fund {
                continue;
            }
            handlers
                .entry(symbol.clone())
                .or_default()
                .push(manager.build_engine());
        }
    }

    handlers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{CandleSource, Engine, VecCandleSource};
    use crate::domain::types::Candle;
    use anyhow::Result;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct NoopEngine;
    impl Engine for NoopEngine {
        fn process(&mut self, _candle: &Candle, _is_historical: bool) -> Result<()> {
            Ok(())
        }
    }

    struct TestTradingManager {
        symbol: Symbol,
        liquidated: Arc<AtomicU64>,
    }

    impl TradingManager for TestTradingManager {
        fn symbol(&self) -> &Symbol {
            &self.symbol
        }
        fn build_engine(&self) -> Box<dyn Engine> {
            Box::new(NoopEngine)
        }
        fn liquidate_open_positions(&self) -> Result<()> {
            self.liquidated.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct TestAccount {
        managers: Vec<Arc<dyn TradingManager>>,
        reset_count: Arc<AtomicU64>,
    }

    impl Account for TestAccount {
        fn symbol_pairs(&self) -> HashMap<Symbol, (String, String)> {
            self.managers
                .iter()
                .map(|m| {
                    let symbol = m.symbol().clone();
                    let pair = (symbol.asset().to_string(), symbol.fund().to_string());
                    (symbol, pair)
                })
                .collect()
        }
        fn all_trading_managers(&self) -> Vec<Arc<dyn TradingManager>> {
            self.managers.clone()
        }
        fn reference_currency_symbol(&self) -> String {
            "USDT".to_string()
        }
        fn total_funds_in_reference_currency(&self) -> Decimal {
            Decimal::ZERO
        }
        fn client_id(&self) -> String {
            "test-account".to_string()
        }
        fn reset_balances(&self) -> Result<()> {
            self.reset_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct RecordingStore;
    #[async_trait]
    impl CandleStore for RecordingStore {
        async fn iterate(
            &self,
            _symbol: &Symbol,
            start_ms: i64,
            _end_ms: i64,
            _preload: bool,
        ) -> Result<Box<dyn CandleSource>> {
            Ok(Box::new(VecCandleSource::new(vec![Candle::at(start_ms)])))
        }
        async fn known_symbols(&self) -> Result<Vec<Symbol>> {
            Ok(Vec::new())
        }
        async fn clear_caches(&self) {}
    }

    struct NoopReporter;
    impl Reporter for NoopReporter {
        fn report(&self, _account: &dyn Account) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn run_one_liquidates_and_reports_after_dispatch() {
        let liquidated = Arc::new(AtomicU64::new(0));
        let reset_count = Arc::new(AtomicU64::new(0));
        let manager: Arc<dyn TradingManager> = Arc::new(TestTradingManager {
            symbol: Symbol::from_pair("BTC", "USDT"),
            liquidated: liquidated.clone(),
        });
        let account: Arc<dyn Account> = Arc::new(TestAccount {
            managers: vec![manager],
            reset_count: reset_count.clone(),
        });

        let driver = SimulationDriver::new(Arc::new(RecordingStore), Arc::new(NoopReporter), 4);
        let set = ParameterSet {
            label: "run-1".to_string(),
            accounts: vec![account],
            start_ms: 0,
            end_ms: 60_000,
            cache_candles: false,
            active_query_limit: 10,
        };

        let reports = driver.run_parameter_stream(vec![set]).await;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].candles_processed, 1);
        assert_eq!(reset_count.load(Ordering::SeqCst), 1);
        assert_eq!(liquidated.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn degenerate_symbol_pair_is_skipped() {
        let liquidated = Arc::new(AtomicU64::new(0));
        let reset_count = Arc::new(AtomicU64::new(0));
        let manager: Arc<dyn TradingManager> = Arc::new(TestTradingManager {
            symbol: Symbol::from_pair("USDT", "USDT"),
            liquidated,
        });
        let account: Arc<dyn Account> = Arc::new(TestAccount {
            managers: vec![manager],
            reset_count,
        });

        let handlers = build_symbol_handlers(&[account]);
        assert!(handlers.is_empty());
    }
}
