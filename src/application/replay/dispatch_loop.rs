//! The hot loop: scans readers in symbol order, emits ready candles to their
//! engines, refills pending slots, and rewinds the clock when a refill
//! reveals another candle for the window already scanned this pass.

use crate::domain::errors::ReplayError;
use crate::domain::replay::{MarketReader, ReplayClock};
use tracing::{debug, info, trace, warn};

/// Drives every candle in every reader's stream through its engines exactly
/// once, in a globally time-ordered manner.
///
/// `readers` must already be sorted by symbol (see `build_readers`); within
/// one minute window, reader order is the dispatch order.
pub fn run(mut readers: Vec<MarketReader>, start_ms: i64, end_ms: i64) -> Result<u64, ReplayError> {
    if end_ms < start_ms {
        return Err(ReplayError::ConfigFailure {
            start: start_ms,
            end: end_ms,
        });
    }

    let mut clock = ReplayClock::new(start_ms, end_ms);
    let mut candles_processed: u64 = 0;
    let mut ticks: u64 = 0;

    while !clock.is_done() {
        ticks += 1;
        let mut reset_clock = false;

        for reader in readers.iter_mut() {
            if reader.is_terminal() {
                continue;
            }

            let pending = reader.pending().copied();
            match pending {
                Some(candle) if clock.in_window(candle.open_time) => {
                    trace!(symbol = %reader.symbol, open_time = candle.open_time, "dispatching candle");
                    for engine in reader.engines.iter_mut() {
                        engine.process(&candle, false).map_err(|source| {
                            ReplayError::EngineFailure {
                                symbol: reader.symbol.key().to_string(),
                                open_time: candle.open_time,
                                source,
                            }
                        })?;
                    }
                    candles_processed += 1;
                    reader.take_pending();
                    if let Some(refilled) = reader.refill()
                        && clock.in_window(refilled.open_time)
                    {
                        // This reader's refill landed back in the window this
                        // pass already scanned past it for. Stop scanning the
                        // remaining readers now rather than let them dispatch
                        // out of order against a candle the rewound pass
                        // hasn't revisited yet.
                        reset_clock = true;
                        break;
                    }
                }
                Some(_) => {
                    // Out of window: leave it buffered, don't dispatch or advance this reader.
                }
                None => {
                    // Construction pre-fetches the first candle, so a
                    // non-terminal reader only reaches here defensively; per
                    // invariant I2 this is a no-op in practice.
                    reader.refill();
                }
            }
        }

        if reset_clock {
            debug!(clock = clock.now(), "rewinding window: refill landed in current minute");
            clock.rewind_one_step();
        }
        clock.advance();
    }

    info!(ticks, candles_processed, start_ms, end_ms, "dispatch loop finished");

    if candles_processed == 0 {
        warn!(start_ms, end_ms, "no candles processed during replay window");
        return Err(ReplayError::EmptyReplay {
            start: start_ms,
            end: end_ms,
        });
    }
    Ok(candles_processed)
}
