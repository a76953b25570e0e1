//! Asynchronously materializes one `CandleSource` per symbol using a
//! bounded worker pool, deciding per symbol whether to preload the full
//! sequence into memory or stream it lazily from the store.

use crate::domain::errors::ReplayError;
use crate::domain::ports::{CandleSource, CandleStore};
use crate::domain::types::Symbol;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, warn};

/// Bounds the number of simultaneously in-flight load tasks against the
/// candle store's worker pool. This is a resource cap on the pool itself,
/// distinct from `active_query_limit`, which governs the preload decision.
pub struct StreamLoader {
    store: Arc<dyn CandleStore>,
    pool_concurrency: usize,
}

impl StreamLoader {
    pub fn new(store: Arc<dyn CandleStore>, pool_concurrency: usize) -> Self {
        Self {
            store,
            pool_concurrency: pool_concurrency.max(1),
        }
    }

    /// Loads every symbol's candle source for `[start_ms, end_ms]`.
    ///
    /// A symbol switches to preload once `cache_all` is set, or once the
    /// number of submissions made so far exceeds `active_query_limit` — the
    /// active-query limit bounds how many simultaneously open store cursors
    /// this run holds; symbols past the limit pay the preload cost instead.
    ///
    /// A failed load is logged and the symbol is simply absent from the
    /// returned map; other symbols proceed (`LoadFailure`, design §7).
    pub async fn load(
        &self,
        symbols: &[Symbol],
        start_ms: i64,
        end_ms: i64,
        cache_all: bool,
        active_query_limit: usize,
    ) -> BTreeMap<Symbol, Box<dyn CandleSource>> {
        let semaphore = Arc::new(Semaphore::new(self.pool_concurrency));
        let mut tasks = JoinSet::new();

        for (submitted, symbol) in symbols.iter().cloned().enumerate() {
            let preload = cache_all || submitted >= active_query_limit;
            let store = self.store.clone();
            let permit = semaphore.clone();
            tasks.spawn(async move {
                let _permit = permit
                    .acquire_owned()
                    .await
                    .expect("stream loader semaphore should never be closed");
                let result = store.iterate(&symbol, start_ms, end_ms, preload).await;
                (symbol, result)
            });
        }

        let mut sources = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((symbol, Ok(source))) => {
                    sources.insert(symbol, source);
                }
                Ok((symbol, Err(err))) => {
                    let load_failure = ReplayError::LoadFailure {
                        symbol: symbol.key().to_string(),
                        reason: err.to_string(),
                    };
                    warn!(%load_failure, "dropping symbol: candle load failed");
                }
                Err(join_err) => {
                    error!(error = %join_err, "candle load task panicked or was cancelled");
                }
            }
        }
        sources
    }
}
