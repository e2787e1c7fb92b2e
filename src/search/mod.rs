//! Comparison orchestration: grounded answer synthesis plus the two ranked hit lists.

pub mod engine;
pub mod synth;

pub use engine::{ComparisonResult, Generation, Orchestrator, PathError, Query};
