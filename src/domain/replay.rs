//! The two value types the dispatch loop is built around: a per-symbol
//! cursor (`MarketReader`) and the virtual one-minute clock (`ReplayClock`).
//!
//! Both are plain structs with mutable fields owned exclusively by the
//! dispatch loop's single thread — no aliasing, no interior mutability.

use crate::domain::ports::{CandleSource, Engine};
use crate::domain::types::{Candle, Symbol, MINUTE_MS};

/// Per-symbol cursor coupling a `CandleSource` to its subscribed engines.
///
/// Invariants (see design §3):
/// - `pending` is the next unemitted candle of `input`, or `None`.
/// - once `input` is exhausted and `pending` is `None`, the reader is
///   terminal and contributes nothing further.
/// - emitting a candle always clears `pending`; a refill then attempts to
///   repopulate it.
pub struct MarketReader {
    pub symbol: Symbol,
    input: Box<dyn CandleSource>,
    pending: Option<Candle>,
    pub engines: Vec<Box<dyn Engine>>,
}

impl MarketReader {
    /// Pre-fetches the first candle into `pending`, so `pending` already
    /// holds `input`'s first candle by the time the dispatch loop's first
    /// tick inspects it (invariant I1: pending is always the next unemitted
    /// candle, not something filled one tick late).
    pub fn new(symbol: Symbol, mut input: Box<dyn CandleSource>, engines: Vec<Box<dyn Engine>>) -> Self {
        let pending = input.has_next().then(|| input.next()).flatten();
        Self {
            symbol,
            input,
            pending,
            engines,
        }
    }

    pub fn pending(&self) -> Option<&Candle> {
        self.pending.as_ref()
    }

    /// `true` once both the buffered slot and the underlying source are
    /// exhausted — this reader will never produce another candle.
    pub fn is_terminal(&self) -> bool {
        self.pending.is_none() && !self.input.has_next()
    }

    /// Emits the buffered candle, leaving `pending` empty.
    pub fn take_pending(&mut self) -> Option<Candle> {
        self.pending.take()
    }

    /// Attempts to pull the next candle from `input` into `pending`.
    /// Returns the refilled candle, if any.
    pub fn refill(&mut self) -> Option<&Candle> {
        if self.input.has_next() {
            self.pending = self.input.next();
        }
        self.pending.as_ref()
    }
}

/// Virtual time cursor advancing in one-minute steps from `start_ms` to
/// `end_ms`, with a rewind primitive the dispatch loop uses to revisit a
/// window when a reader's refill reveals another same-minute candle.
pub struct ReplayClock {
    clock: i64,
    #[allow(dead_code)]
    start_ms: i64,
    end_ms: i64,
}

impl ReplayClock {
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self {
            clock: start_ms,
            start_ms,
            end_ms,
        }
    }

    pub fn now(&self) -> i64 {
        self.clock
    }

    /// `clock > end_ms`: the loop has stepped past the simulation window.
    pub fn is_done(&self) -> bool {
        self.clock > self.end_ms
    }

    pub fn advance(&mut self) {
        self.clock += MINUTE_MS;
    }

    /// Sets `clock -= MINUTE_MS`; takes effect only once followed by the
    /// normal `advance()` for this pass, so it nets to "replay this window".
    pub fn rewind_one_step(&mut self) {
        self.clock -= MINUTE_MS;
    }

    /// Half-open minute bucket `[clock, clock + MINUTE_MS)` with a one-ms
    /// tolerance on the lower edge, admitting `open_time == clock - 1`.
    pub fn in_window(&self, open_time: i64) -> bool {
        open_time + 1 >= self.clock && open_time <= self.clock + MINUTE_MS - 1
    }
}
