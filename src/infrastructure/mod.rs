// Concrete adapters for the `domain::ports` traits. Everything here is a
// fixture/demo implementation; a production deployment swaps these for
// exchange- and database-backed adapters (out of scope for this crate).
pub mod candle_store;
pub mod mock_account;
pub mod reporter;
