//! Configuration module: replay settings loaded from environment variables,
//! organized the way the rest of this crate's ambient stack is (structured
//! loading, parse-with-default-fallback per field).

mod simulation_settings;

pub use simulation_settings::SimulationSettings;
