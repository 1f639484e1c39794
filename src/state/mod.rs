//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `RunPhase`: Orchestrator phase (idle, session open, discovering, fetching, aggregating, closed)
//! - `RunMeta`: Persisted singleton carrying the run watermark and completion flag

mod run_meta;
mod run_phase;

// Re-export main types
pub use run_meta::{from_db_timestamp, to_db_timestamp, RunMeta};
pub use run_phase::RunPhase;
