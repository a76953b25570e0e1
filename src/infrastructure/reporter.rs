//! Console reporting: prints a one-line summary per account after each
//! parameter set finishes, the way `server.rs`'s periodic metrics log does.

use crate::domain::ports::{Account, Reporter};
use anyhow::Result;
use tracing::info;

/// Logs account state through `tracing` rather than writing a dashboard or
/// a file; a real deployment would swap this for the metrics/export layer
/// (out of scope for this crate, per design §1).
#[derive(Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, account: &dyn Account) -> Result<()> {
        info!(
            client_id = %account.client_id(),
            reference_currency = %account.reference_currency_symbol(),
            total_funds = %account.total_funds_in_reference_currency(),
            managed_symbols = account.all_trading_managers().len(),
            "run complete"
        );
        Ok(())
    }
}
