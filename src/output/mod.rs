//! Output module for committing harvest results
//!
//! This module handles:
//! - Deduplicating a run's articles against each other and the store
//! - Writing new articles and the run marker
//! - Reporting store statistics

mod persister;
pub mod stats;

pub use persister::{CommitSummary, Persister};
pub use stats::{load_statistics, print_statistics, HarvestStatistics};
