//! Outer per-parameter-set orchestration built on top of `application::replay`.

pub mod driver;

pub use driver::{ParameterSet, RunReport, SimulationDriver};
