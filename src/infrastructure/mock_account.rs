//! A minimal `Account`/`TradingManager`/`Engine` stand-in for the demo
//! binary and integration tests. Real account bookkeeping and order
//! matching live in the trading-manager/exchange subsystem, out of scope
//! for this crate (design §1).

use crate::domain::ports::{Account, Engine, TradingManager};
use crate::domain::types::{Candle, Symbol};
use anyhow::Result;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;

/// Counts candles it has seen; stands in for a strategy engine's private
/// state without interpreting it.
pub struct CountingEngine {
    symbol: Symbol,
    seen: Arc<AtomicU64>,
}

impl CountingEngine {
    pub fn new(symbol: Symbol, seen: Arc<AtomicU64>) -> Self {
        Self { symbol, seen }
    }
}

impl Engine for CountingEngine {
    fn process(&mut self, candle: &Candle, is_historical: bool) -> Result<()> {
        debug!(symbol = %self.symbol, open_time = candle.open_time, is_historical, "engine processed candle");
        self.seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Backs one symbol for one account; builds a fresh `CountingEngine` per
/// run and tracks how many times it was asked to liquidate.
pub struct MockTradingManager {
    symbol: Symbol,
    candles_seen: Arc<AtomicU64>,
    liquidations: Arc<AtomicU64>,
}

impl MockTradingManager {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            candles_seen: Arc::new(AtomicU64::new(0)),
            liquidations: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn candles_seen(&self) -> u64 {
        self.candles_seen.load(Ordering::SeqCst)
    }

    pub fn liquidation_count(&self) -> u64 {
        self.liquidations.load(Ordering::SeqCst)
    }
}

impl TradingManager for MockTradingManager {
    fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    fn build_engine(&self) -> Box<dyn Engine> {
        Box::new(CountingEngine::new(self.symbol.clone(), self.candles_seen.clone()))
    }

    fn liquidate_open_positions(&self) -> Result<()> {
        self.liquidations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// One configured account trading a fixed set of symbols against a constant
/// starting balance.
pub struct MockAccount {
    client_id: String,
    reference_currency: String,
    starting_funds: Decimal,
    funds: RwLock<Decimal>,
    pairs: HashMap<Symbol, (String, String)>,
    managers: Vec<Arc<dyn TradingManager>>,
    reset_count: Mutex<u64>,
}

impl MockAccount {
    pub fn new(client_id: impl Into<String>, reference_currency: impl Into<String>, starting_funds: Decimal, symbols: Vec<Symbol>) -> Self {
        let pairs = symbols
            .iter()
            .map(|s| (s.clone(), (s.asset().to_string(), s.fund().to_string())))
            .collect();
        let managers = symbols
            .into_iter()
            .map(|s| Arc::new(MockTradingManager::new(s)) as Arc<dyn TradingManager>)
            .collect();
        Self {
            client_id: client_id.into(),
            reference_currency: reference_currency.into(),
            starting_funds,
            funds: RwLock::new(starting_funds),
            pairs,
            managers,
            reset_count: Mutex::new(0),
        }
    }

    pub fn reset_count(&self) -> u64 {
        *self.reset_count.lock().expect("reset_count mutex poisoned")
    }
}

impl Account for MockAccount {
    fn symbol_pairs(&self) -> HashMap<Symbol, (String, String)> {
        self.pairs.clone()
    }

    fn all_trading_managers(&self) -> Vec<Arc<dyn TradingManager>> {
        self.managers.clone()
    }

    fn reference_currency_symbol(&self) -> String {
        self.reference_currency.clone()
    }

    fn total_funds_in_reference_currency(&self) -> Decimal {
        *self.funds.read().expect("funds lock poisoned")
    }

    fn client_id(&self) -> String {
        self.client_id.clone()
    }

    fn reset_balances(&self) -> Result<()> {
        *self.funds.write().expect("funds lock poisoned") = self.starting_funds;
        *self.reset_count.lock().expect("reset_count mutex poisoned") += 1;
        Ok(())
    }
}
