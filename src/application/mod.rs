// The multi-stream chronological replay engine: stream loading + dispatch.
pub mod replay;

// Per-parameter-set orchestration built on top of `replay`.
pub mod simulation;
