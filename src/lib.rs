//! Moto-Harvest: a classifieds harvester for vehicle listings
//!
//! This crate discovers the result pages of a filtered search, extracts every
//! listing block, normalises its fields, reveals the seller's phone numbers and
//! stores the previously unseen records in SQLite.

pub mod config;
pub mod crawler;
pub mod models;
pub mod normalize;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Moto-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("No response received from {url}")]
    NoResponse { url: String },

    #[error("Concurrency gate closed")]
    GateClosed,

    #[error("Invalid header {name}: {message}")]
    InvalidHeader { name: String, message: String },

    #[error("Invalid selector {selector}: {message}")]
    Selector { selector: String, message: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Invalid run transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::RunPhase,
        to: state::RunPhase,
    },

    #[error("HTTP session is not open")]
    SessionClosed,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

// Re-export commonly used types
pub use config::Config;
pub use models::{NormalizedArticle, PageUnitResult};
pub use normalize::{article_id, canonical_link, normalize_article, Rejection};
pub use state::{RunMeta, RunPhase};
