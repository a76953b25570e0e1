//! The replay core: loads per-symbol streams, builds sorted readers, and
//! drives the dispatch loop over them.

pub mod dispatch_loop;
pub mod stream_loader;

use crate::domain::ports::{CandleSource, Engine};
use crate::domain::replay::MarketReader;
use crate::domain::types::Symbol;
use std::collections::BTreeMap;

pub use stream_loader::StreamLoader;

/// `Symbol -> ordered sequence of Engine`, built once per parameter set.
/// Only symbols with at least one subscribed engine are populated.
pub type SymbolHandlers = BTreeMap<Symbol, Vec<Box<dyn Engine>>>;

/// Joins loaded candle sources with `SymbolHandlers` into a stable,
/// lexicographically-sorted list of readers (`BTreeMap`'s iteration order
/// on `Symbol` is the tie-break the dispatch loop relies on). Symbols that
/// loaded successfully but have no subscribed engine are dropped; symbols
/// with handlers but no successfully-loaded source were already dropped by
/// the stream loader's error policy.
pub fn build_readers(
    sources: BTreeMap<Symbol, Box<dyn CandleSource>>,
    mut handlers: SymbolHandlers,
) -> Vec<MarketReader> {
    sources
        .into_iter()
        .filter_map(|(symbol, source)| {
            let engines = handlers.remove(&symbol)?;
            Some(MarketReader::new(symbol, source, engines))
        })
        .collect()
}
