//! In-memory `CandleStore` implementation.
//!
//! Thread-safe, read-only fixture store: suitable for tests and for the
//! `backtest` binary's demo mode. A real deployment would back `CandleStore`
//! with the historical candle repository (out of scope for this crate, per
//! design §1).

use crate::domain::ports::{CandleSource, CandleStore, VecCandleSource};
use crate::domain::types::{Candle, Symbol};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Read-only in-memory candle store keyed by symbol, with every candle
/// already held in ascending `open_time` order.
pub struct InMemoryCandleStore {
    candles: RwLock<HashMap<Symbol, Vec<Candle>>>,
    clears: AtomicU64,
}

impl InMemoryCandleStore {
    pub fn new(candles: HashMap<Symbol, Vec<Candle>>) -> Self {
        Self {
            candles: RwLock::new(candles),
            clears: AtomicU64::new(0),
        }
    }

    /// Number of times `clear_caches` has been called; exposed for tests.
    pub fn clear_count(&self) -> u64 {
        self.clears.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CandleStore for InMemoryCandleStore {
    async fn iterate(
        &self,
        symbol: &Symbol,
        start_ms: i64,
        end_ms: i64,
        _preload: bool,
    ) -> Result<Box<dyn CandleSource>> {
        let candles = self
            .candles
            .read()
            .expect("candle store lock poisoned")
            .get(symbol)
            .cloned()
            .unwrap_or_default();

        let in_range: Vec<Candle> = candles
            .into_iter()
            .filter(|c| c.open_time >= start_ms && c.open_time <= end_ms)
            .collect();

        // `preload` only changes whether the real store materializes eagerly
        // or streams lazily; this fixture always holds everything in memory,
        // so both paths return the same `VecCandleSource`.
        Ok(Box::new(VecCandleSource::new(in_range)))
    }

    async fn known_symbols(&self) -> Result<Vec<Symbol>> {
        Ok(self
            .candles
            .read()
            .expect("candle store lock poisoned")
            .keys()
            .cloned()
            .collect())
    }

    async fn clear_caches(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}
