//! Operational-health engine for governance activity.
//!
//! Consumes an immutable activity snapshot (proposals, pull requests,
//! comments) plus a reference time and derives SLO evaluations, open
//! incidents, a reliability budget, workflow bottlenecks, and a versioned
//! health history artifact. The engine performs no I/O and never mutates its
//! inputs; persistence and rendering belong to the caller.

pub mod analysis;
pub mod config;
pub mod error;
pub mod history;
pub mod model;

pub use analysis::{analyze, HealthReport};
pub use config::EngineConfig;
pub use error::EngineError;
