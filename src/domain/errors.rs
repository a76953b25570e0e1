//! Typed errors raised by the replay core.
//!
//! Mirrors the error kinds enumerated in the design's error-handling section:
//! a failed per-symbol load is recoverable (logged and dropped), an empty
//! replay is fatal, an engine failure propagates, and a bad configuration is
//! the caller's fault.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to load candle stream for {symbol}: {reason}")]
    LoadFailure { symbol: String, reason: String },

    #[error("no candles processed in simulation from {start} to {end}")]
    EmptyReplay { start: i64, end: i64 },

    #[error("engine failed while processing candle at {open_time} for {symbol}: {source}")]
    EngineFailure {
        symbol: String,
        open_time: i64,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid simulation bounds: end ({end}) < start ({start})")]
    ConfigFailure { start: i64, end: i64 },
}
