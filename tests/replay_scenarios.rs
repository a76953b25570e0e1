//! End-to-end scenarios for the multi-stream chronological replay engine,
//! driven through `SimulationDriver` against `InMemoryCandleStore`, mirroring
//! the named scenarios this lineage's own component tests exercise end to
//! end rather than unit-by-unit.

use anyhow::Result;
use async_trait::async_trait;
use candle_replay::application::simulation::{ParameterSet, SimulationDriver};
use candle_replay::domain::ports::{
    Account, CandleSource, CandleStore, Engine, Reporter, TradingManager, VecCandleSource,
};
use candle_replay::domain::types::{Candle, Symbol};
use candle_replay::infrastructure::candle_store::InMemoryCandleStore;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Records `(symbol, open_time)` as each candle reaches an engine, in the
/// order engines see them.
struct RecordingEngine {
    symbol: Symbol,
    log: Arc<Mutex<Vec<(String, i64)>>>,
}

impl Engine for RecordingEngine {
    fn process(&mut self, candle: &Candle, _is_historical: bool) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .push((self.symbol.key().to_string(), candle.open_time));
        Ok(())
    }
}

struct RecordingManager {
    symbol: Symbol,
    log: Arc<Mutex<Vec<(String, i64)>>>,
}

impl TradingManager for RecordingManager {
    fn symbol(&self) -> &Symbol {
        &self.symbol
    }
    fn build_engine(&self) -> Box<dyn Engine> {
        Box::new(RecordingEngine {
            symbol: self.symbol.clone(),
            log: self.log.clone(),
        })
    }
    fn liquidate_open_positions(&self) -> Result<()> {
        Ok(())
    }
}

struct RecordingAccount {
    managers: Vec<Arc<dyn TradingManager>>,
}

impl Account for RecordingAccount {
    fn symbol_pairs(&self) -> HashMap<Symbol, (String, String)> {
        self.managers
            .iter()
            .map(|m| {
                let s = m.symbol().clone();
                ((s.clone()), (s.asset().to_string(), s.fund().to_string()))
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
        "scenario-account".to_string()
    }
    fn reset_balances(&self) -> Result<()> {
        Ok(())
    }
}

struct NoopReporter;
impl Reporter for NoopReporter {
    fn report(&self, _account: &dyn Account) -> Result<()> {
        Ok(())
    }
}

fn sym(name: &str) -> Symbol {
    Symbol::from_pair(name, "USDT")
}

fn account_for(log: &Arc<Mutex<Vec<(String, i64)>>>, symbols: &[Symbol]) -> Arc<dyn Account> {
    let managers = symbols
        .iter()
        .map(|s| {
            Arc::new(RecordingManager {
                symbol: s.clone(),
                log: log.clone(),
            }) as Arc<dyn TradingManager>
        })
        .collect();
    Arc::new(RecordingAccount { managers })
}

#[tokio::test]
async fn two_symbols_interleave_in_open_time_order() {
    let a = sym("A");
    let b = sym("B");
    let mut candles = HashMap::new();
    candles.insert(a.clone(), vec![Candle::at(0), Candle::at(120_000)]);
    candles.insert(b.clone(), vec![Candle::at(60_000), Candle::at(180_000)]);
    let store = Arc::new(InMemoryCandleStore::new(candles));

    let log = Arc::new(Mutex::new(Vec::new()));
    let driver = SimulationDriver::new(store, Arc::new(NoopReporter), 4);
    let account = account_for(&log, &[a, b]);
    let set = ParameterSet {
        label: "interleaved".to_string(),
        accounts: vec![account],
        start_ms: 0,
        end_ms: 240_000,
        cache_candles: false,
        active_query_limit: 10,
    };

    let reports = driver.run_parameter_stream(vec![set]).await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].candles_processed, 4);

    let seen = log.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            ("AUSDT".to_string(), 0),
            ("BUSDT".to_string(), 60_000),
            ("AUSDT".to_string(), 120_000),
            ("BUSDT".to_string(), 180_000),
        ]
    );
}

#[tokio::test]
async fn same_minute_overlap_rewinds_before_dispatching_out_of_window_candle() {
    let a = sym("A");
    let b = sym("B");
    let mut candles = HashMap::new();
    candles.insert(a.clone(), vec![Candle::at(0), Candle::at(30)]);
    candles.insert(b.clone(), vec![Candle::at(45)]);
    let store = Arc::new(InMemoryCandleStore::new(candles));

    let log = Arc::new(Mutex::new(Vec::new()));
    let driver = SimulationDriver::new(store, Arc::new(NoopReporter), 4);
    let account = account_for(&log, &[a, b]);
    let set = ParameterSet {
        label: "rewind".to_string(),
        accounts: vec![account],
        start_ms: 0,
        end_ms: 60_000,
        cache_candles: false,
        active_query_limit: 10,
    };

    let reports = driver.run_parameter_stream(vec![set]).await;
    assert_eq!(reports[0].candles_processed, 3);

    let seen = log.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            ("AUSDT".to_string(), 0),
            ("AUSDT".to_string(), 30),
            ("BUSDT".to_string(), 45),
        ]
    );
}

#[tokio::test]
async fn preload_threshold_dispatches_every_symbol_regardless_of_preload_choice() {
    let symbols: Vec<Symbol> = (0..5).map(|i| sym(&format!("SYM{i}"))).collect();
    let mut candles = HashMap::new();
    for s in &symbols {
        candles.insert(s.clone(), vec![Candle::at(0)]);
    }
    let store = Arc::new(InMemoryCandleStore::new(candles));

    let log = Arc::new(Mutex::new(Vec::new()));
    let driver = SimulationDriver::new(store, Arc::new(NoopReporter), 4);
    let account = account_for(&log, &symbols);
    let set = ParameterSet {
        label: "preload-threshold".to_string(),
        accounts: vec![account],
        start_ms: 0,
        end_ms: 60_000,
        cache_candles: false,
        active_query_limit: 2,
    };

    let reports = driver.run_parameter_stream(vec![set]).await;
    assert_eq!(reports[0].candles_processed, 5);
    assert_eq!(log.lock().unwrap().len(), 5);
}

#[tokio::test]
async fn empty_run_aborts_without_producing_a_report() {
    let a = sym("A");
    let store = Arc::new(InMemoryCandleStore::new(HashMap::from([(a.clone(), Vec::new())])));

    let log = Arc::new(Mutex::new(Vec::new()));
    let driver = SimulationDriver::new(store, Arc::new(NoopReporter), 4);
    let account = account_for(&log, &[a]);
    let set = ParameterSet {
        label: "empty".to_string(),
        accounts: vec![account],
        start_ms: 0,
        end_ms: 60_000,
        cache_candles: false,
        active_query_limit: 10,
    };

    let reports = driver.run_parameter_stream(vec![set]).await;
    assert!(reports.is_empty(), "an all-empty replay should be logged and skipped, not reported");
}

/// A `CandleStore` that fails to load one named symbol and succeeds for
/// everything else, exercising `StreamLoader`'s drop-and-warn policy end to
/// end.
struct PartiallyFailingStore {
    fail_symbol: Symbol,
    candles: HashMap<Symbol, Vec<Candle>>,
}

#[async_trait]
impl CandleStore for PartiallyFailingStore {
    async fn iterate(
        &self,
        symbol: &Symbol,
        start_ms: i64,
        end_ms: i64,
        _preload: bool,
    ) -> Result<Box<dyn CandleSource>> {
        if symbol == &self.fail_symbol {
            anyhow::bail!("synthetic load failure for {symbol}");
        }
        let in_range = self
            .candles
            .get(symbol)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|c| c.open_time >= start_ms && c.open_time <= end_ms)
            .collect();
        Ok(Box::new(VecCandleSource::new(in_range)))
    }

    async fn known_symbols(&self) -> Result<Vec<Symbol>> {
        Ok(self.candles.keys().cloned().collect())
    }

    async fn clear_caches(&self) {}
}

#[tokio::test]
async fn one_symbol_load_failure_does_not_block_the_other() {
    let x = sym("X");
    let y = sym("Y");
    let mut candles = HashMap::new();
    candles.insert(x.clone(), vec![Candle::at(0)]);
    candles.insert(y.clone(), vec![Candle::at(0), Candle::at(60_000)]);
    let store = Arc::new(PartiallyFailingStore {
        fail_symbol: x.clone(),
        candles,
    });

    let log = Arc::new(Mutex::new(Vec::new()));
    let driver = SimulationDriver::new(store, Arc::new(NoopReporter), 4);
    let account = account_for(&log, &[x, y]);
    let set = ParameterSet {
        label: "partial-failure".to_string(),
        accounts: vec![account],
        start_ms: 0,
        end_ms: 60_000,
        cache_candles: false,
        active_query_limit: 10,
    };

    let reports = driver.run_parameter_stream(vec![set]).await;
    assert_eq!(reports[0].candles_processed, 2);
    let seen = log.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![("YUSDT".to_string(), 0), ("YUSDT".to_string(), 60_000)]
    );
}

#[tokio::test]
async fn candles_past_end_ms_are_silently_dropped() {
    let a = sym("A");
    let store = Arc::new(InMemoryCandleStore::new(HashMap::from([(
        a.clone(),
        vec![Candle::at(0), Candle::at(60_000), Candle::at(120_000)],
    )])));

    let log = Arc::new(Mutex::new(Vec::new()));
    let driver = SimulationDriver::new(store, Arc::new(NoopReporter), 4);
    let account = account_for(&log, &[a]);
    let set = ParameterSet {
        label: "truncation".to_string(),
        accounts: vec![account],
        start_ms: 0,
        end_ms: 60_000,
        cache_candles: false,
        active_query_limit: 10,
    };

    let reports = driver.run_parameter_stream(vec![set]).await;
    assert_eq!(reports[0].candles_processed, 2);
    let seen = log.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![("AUSDT".to_string(), 0), ("AUSDT".to_string(), 60_000)]
    );
}
