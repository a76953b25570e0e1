// Domain-specific error types
pub mod errors;

// Port interfaces to external collaborators (candle store, engines, accounts)
pub mod ports;

// The replay core's value types: MarketReader, ReplayClock
pub mod replay;

// Core data types: Candle, Symbol
pub mod types;
