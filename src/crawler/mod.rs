//! Crawler module for listing page fetching and processing
//!
//! This module contains the core harvesting logic, including:
//! - Gate-bounded HTTP fetching with retry logic
//! - Page discovery from the search result pager
//! - Listing block extraction
//! - Seller phone lookup
//! - Overall run coordination

mod coordinator;
mod discovery;
mod fetcher;
mod parser;
mod phones;

pub use coordinator::{run_harvest, Coordinator};
pub use discovery::{page_count, page_urls, search_form, PageDiscovery};
pub use fetcher::{build_http_client, HttpResponse, RateLimitedClient, RetryPolicy};
pub use parser::ArticleExtractor;
pub use phones::PhoneFetcher;
