//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::models::NormalizedArticle;
use crate::state::RunMeta;
use crate::storage::StoredArticle;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid stored value in {column}: {value}")]
    InvalidValue { column: &'static str, value: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines the durable-store operations needed by a harvest run.
pub trait Storage {
    // ===== Articles =====

    /// Looks up a stored article by its identity
    fn get_article(&self, id: &str) -> StorageResult<Option<StoredArticle>>;

    /// Whether an article with this identity is already stored
    fn contains_article(&self, id: &str) -> StorageResult<bool> {
        Ok(self.get_article(id)?.is_some())
    }

    /// Inserts articles and their phone numbers in one transaction
    ///
    /// Every inserted row receives the same `record_created` timestamp,
    /// taken at insertion time.
    ///
    /// # Returns
    ///
    /// The number of articles inserted
    fn bulk_insert(&mut self, articles: &[NormalizedArticle]) -> StorageResult<usize>;

    /// Phone numbers of one article, in reveal order
    fn get_phones(&self, article_id: &str) -> StorageResult<Vec<String>>;

    // ===== Run Marker =====

    /// Returns the singleton run marker, creating an empty one if absent
    fn get_or_create_meta(&mut self) -> StorageResult<RunMeta>;

    /// Writes the singleton run marker immediately
    fn save_meta(&mut self, meta: &RunMeta) -> StorageResult<()>;

    // ===== Statistics =====

    /// Counts all stored articles
    fn count_articles(&self) -> StorageResult<u64>;

    /// Counts all stored phone numbers
    fn count_phones(&self) -> StorageResult<u64>;

    /// Counts articles created strictly after `since`
    fn count_articles_since(&self, since: &DateTime<Utc>) -> StorageResult<u64>;
}
