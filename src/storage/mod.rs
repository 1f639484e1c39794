//! Storage module for persisting harvest data
//!
//! This module handles all database operations of a harvest, including:
//! - SQLite database initialization and schema management
//! - Article and phone number persistence
//! - The singleton run marker

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

/// Represents an article row in the database
#[derive(Debug, Clone)]
pub struct StoredArticle {
    pub id: String,
    pub name: String,
    pub manufacturer: String,
    pub year: i32,
    pub mileage: i64,
    pub engine_capacity: f64,
    pub engine_type: String,
    /// Decimal price as written
    pub value: String,
    pub currency: String,
    pub link: String,
    pub seller_id: String,
    pub record_created: String,
    pub on_delete: bool,
}
