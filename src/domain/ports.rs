//! Port traits the replay core depends on.
//!
//! These are the external collaborators named in the design as out of
//! scope for the core itself (candle store, engines, account/trading
//! manager, reporting): the core only ever calls through these interfaces.

use crate::domain::types::{Candle, Symbol};
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// A finite, single-pass, time-ordered sequence of candles for one symbol.
///
/// Intentionally not `Iterator`: a `CandleSource` may be backed by an
/// eagerly-materialized buffer (preload) or a lazy store cursor, and the
/// core only ever needs `has_next`/`next`, matching the external contract
/// in the design (`CandleSource`).
pub trait CandleSource: Send {
    fn has_next(&self) -> bool;
    fn next(&mut self) -> Option<Candle>;
}

/// An in-memory `CandleSource` over a pre-fetched buffer. Used both for the
/// `preload = true` path of `StreamLoader` and by tests.
pub struct VecCandleSource {
    candles: std::vec::IntoIter<Candle>,
}

impl VecCandleSource {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self {
            candles: candles.into_iter(),
        }
    }
}

impl CandleSource for VecCandleSource {
    fn has_next(&self) -> bool {
        self.candles.as_slice().first().is_some()
    }

    fn next(&mut self) -> Option<Candle> {
        self.candles.next()
    }
}

/// The historical candle repository. Yields one `CandleSource` per symbol
/// for a time range, either streamed lazily or preloaded in full.
#[async_trait]
pub trait CandleStore: Send + Sync {
    async fn iterate(
        &self,
        symbol: &Symbol,
        start_ms: i64,
        end_ms: i64,
        preload: bool,
    ) -> Result<Box<dyn CandleSource>>;

    async fn known_symbols(&self) -> Result<Vec<Symbol>>;

    async fn clear_caches(&self);
}

/// An opaque strategy consumer. Receives candles one at a time and owns its
/// own private state; the core never inspects that state.
///
/// `process` is expected to be idempotent per `(engine, candle)` and is
/// invoked at most once per candle per engine.
pub trait Engine: Send {
    fn process(&mut self, candle: &Candle, is_historical: bool) -> Result<()>;
}

/// Drives order matching for one symbol against a simulated exchange on
/// behalf of one account.
pub trait TradingManager: Send + Sync {
    fn symbol(&self) -> &Symbol;

    /// Builds the `Engine` this trading manager backs for the run.
    fn build_engine(&self) -> Box<dyn Engine>;

    /// Closes all open positions for this symbol at the end of a run.
    fn liquidate_open_positions(&self) -> Result<()>;
}

/// One configured trading account: which symbols it trades and the trading
/// managers that back its engines.
pub trait Account: Send + Sync {
    /// `Symbol -> (asset, fund)`, as configured for this account.
    fn symbol_pairs(&self) -> HashMap<Symbol, (String, String)>;

    fn all_trading_managers(&self) -> Vec<std::sync::Arc<dyn TradingManager>>;

    fn reference_currency_symbol(&self) -> String;

    fn total_funds_in_reference_currency(&self) -> Decimal;

    fn client_id(&self) -> String;

    /// Resets balances to the configured starting state; called once per
    /// parameter set before engines are built.
    fn reset_balances(&self) -> Result<()>;
}

/// Publishes the outcome of one parameter set's run.
pub trait Reporter: Send + Sync {
    fn report(&self, account: &dyn Account) -> Result<()>;
}
