//! Core data types shared by every layer of the replay engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds in one minute, the granularity the replay clock advances by.
pub const MINUTE_MS: i64 = 60_000;

/// One fixed-interval OHLCV market-data bar.
///
/// The replay core only ever inspects `open_time`; the remaining fields are
/// opaque payload carried through to engines untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: i64,
}

impl Candle {
    /// Convenience constructor for tests and simple sources; OHLC default to
    /// `close`/`volume` zero when callers only care about timing.
    pub fn at(open_time: i64) -> Self {
        Self {
            open_time,
            open: 0.0,
            high: 0.0,
            low: 0.0,
            close: 0.0,
            volume: 0.0,
            close_time: open_time + MINUTE_MS - 1,
        }
    }
}

/// A tradable instrument identifier, conventionally `{asset}{fund}`
/// (e.g. `BTCUSDT` = asset `BTC`, fund `USDT`).
///
/// `asset`/`fund` are derived once at construction rather than recomputed on
/// every access, mirroring how `TimeframeCandle` precomputes its end
/// timestamp instead of deriving it per call.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol {
    key: String,
    asset: String,
    fund: String,
}

impl Symbol {
    /// Splits `key` into `(asset, fund)` given the fund currency's length in
    /// characters (the caller — configuration — knows which fund currencies
    /// it trades against, e.g. 4 for `USDT`, 3 for `USD`/`BTC`).
    pub fn new(key: impl Into<String>, fund_len: usize) -> Self {
        let key = key.into();
        let split_at = key.len().saturating_sub(fund_len);
        let asset = key[..split_at].to_string();
        let fund = key[split_at..].to_string();
        Self { key, asset, fund }
    }

    /// Builds a symbol from an already-known `(asset, fund)` pair.
    pub fn from_pair(asset: impl Into<String>, fund: impl Into<String>) -> Self {
        let asset = asset.into();
        let fund = fund.into();
        let key = format!("{asset}{fund}");
        Self { key, asset, fund }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn fund(&self) -> &str {
        &self.fund
    }

    /// `true` when asset and fund are the same currency — such symbols carry
    /// no trade and are skipped by the driver (`spec.md` §3).
    pub fn is_degenerate(&self) -> bool {
        self.asset == self.fund
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}
