//! Replay settings loaded from environment variables.
//!
//! Follows the parse-with-default-fallback idiom used throughout this
//! lineage's `config` module: each field is read independently via
//! `env::var(..).ok().and_then(|v| v.parse().ok()).unwrap_or(default)`, so a
//! malformed or absent variable never aborts startup, it just falls back.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::env;

/// Settings the replay core and its surrounding orchestration read at
/// startup. `backfill_from`/`backfill_to`/`tick_interval`/`resume_backfill`
/// configure a history-fill subsystem outside the replay core itself
/// (`spec.md` §6); they are carried here only so one env-driven settings
/// struct covers the whole binary.
#[derive(Debug, Clone)]
pub struct SimulationSettings {
    /// Force preload for all symbols, bypassing the `active_query_limit`
    /// threshold entirely.
    pub cache_candles: bool,

    /// Number of symbols that may load lazily before `StreamLoader` starts
    /// switching the remainder to preload.
    pub active_query_limit: usize,

    /// Inclusive replay start bound, UTC.
    pub simulation_start: DateTime<Utc>,

    /// Inclusive replay end bound, UTC.
    pub simulation_end: DateTime<Utc>,

    /// History-fill window start; unused by the replay core.
    pub backfill_from: Option<DateTime<Utc>>,

    /// History-fill window end; unused by the replay core.
    pub backfill_to: Option<DateTime<Utc>>,

    /// History-fill poll interval in milliseconds; unused by the replay core.
    pub tick_interval_ms: u64,

    /// Whether a previously interrupted history fill should resume rather
    /// than restart; unused by the replay core.
    pub resume_backfill: bool,

    /// Bound on concurrent in-flight `CandleStore::iterate` calls during
    /// stream loading (`StreamLoader`'s worker-pool `Semaphore` permits).
    pub pool_concurrency: usize,
}

impl SimulationSettings {
    pub fn from_env() -> Result<Self> {
        let cache_candles = env::var("CACHE_CANDLES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(false);

        let active_query_limit = env::var("ACTIVE_QUERY_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8);

        let simulation_start = parse_datetime_env("SIMULATION_START")
            .context("Failed to parse SIMULATION_START")?
            .unwrap_or_else(|| DateTime::from_timestamp(0, 0).expect("epoch is a valid timestamp"));

        let simulation_end = parse_datetime_env("SIMULATION_END")
            .context("Failed to parse SIMULATION_END")?
            .unwrap_or_else(Utc::now);

        let backfill_from = parse_datetime_env("BACKFILL_FROM")
            .context("Failed to parse BACKFILL_FROM")?;

        let backfill_to =
            parse_datetime_env("BACKFILL_TO").context("Failed to parse BACKFILL_TO")?;

        let tick_interval_ms = env::var("TICK_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1_000);

        let resume_backfill = env::var("RESUME_BACKFILL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(true);

        let pool_concurrency = env::var("POOL_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(16);

        Ok(Self {
            cache_candles,
            active_query_limit,
            simulation_start,
            simulation_end,
            backfill_from,
            backfill_to,
            tick_interval_ms,
            resume_backfill,
            pool_concurrency,
        })
    }

    pub fn start_ms(&self) -> i64 {
        self.simulation_start.timestamp_millis()
    }

    pub fn end_ms(&self) -> i64 {
        self.simulation_end.timestamp_millis()
    }
}

fn parse_datetime_env(key: &str) -> Result<Option<DateTime<Utc>>> {
    match env::var(key) {
        Ok(raw) => {
            let parsed = DateTime::parse_from_rfc3339(&raw)
                .with_context(|| format!("{key}={raw:?} is not RFC 3339"))?;
            Ok(Some(parsed.with_timezone(&Utc)))
        }
        Err(_) => Ok(None),
    }
}
