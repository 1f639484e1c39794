//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::state::to_db_timestamp;
use crate::storage::{Storage, StorageResult};
use chrono::{DateTime, Utc};

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Total number of stored articles
    pub total_articles: u64,

    /// Total number of stored phone numbers
    pub total_phones: u64,

    /// Watermark of the latest run, if any run has started
    pub last_start: Option<DateTime<Utc>>,

    /// Whether the latest run committed
    pub last_status: bool,

    /// Articles created after the latest watermark
    pub articles_since_last_start: u64,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(storage: &mut dyn Storage) -> StorageResult<HarvestStatistics> {
    let meta = storage.get_or_create_meta()?;

    let articles_since_last_start = match &meta.last_start {
        Some(since) => storage.count_articles_since(since)?,
        None => 0,
    };

    Ok(HarvestStatistics {
        total_articles: storage.count_articles()?,
        total_phones: storage.count_phones()?,
        last_start: meta.last_start,
        last_status: meta.status,
        articles_since_last_start,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Total articles: {}", stats.total_articles);
    println!("  Total phone numbers: {}", stats.total_phones);
    println!();

    println!("Latest Run:");
    match &stats.last_start {
        Some(start) => {
            println!("  Started: {}", to_db_timestamp(start));
            println!(
                "  Status: {}",
                if stats.last_status {
                    "completed"
                } else {
                    "incomplete"
                }
            );
            println!("  New articles: {}", stats.articles_since_last_start);
        }
        None => println!("  No run recorded"),
    }
}
