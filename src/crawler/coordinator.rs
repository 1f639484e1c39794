//! Harvest coordinator - main run orchestration logic
//!
//! This module drives one harvest run through its phases:
//! - Opening the shared HTTP client
//! - Discovering the listing pages of the filtered search
//! - Fetching every page concurrently, extracting and normalising its articles
//!   and revealing each accepted article's phone numbers
//! - Aggregating the per-page outcomes in submission order
//! - Releasing the HTTP client

use crate::config::Config;
use crate::crawler::discovery::PageDiscovery;
use crate::crawler::fetcher::RateLimitedClient;
use crate::crawler::parser::ArticleExtractor;
use crate::crawler::phones::PhoneFetcher;
use crate::models::{NormalizedArticle, PageUnitResult};
use crate::normalize::normalize_article;
use crate::output::{CommitSummary, Persister};
use crate::state::RunPhase;
use crate::storage::SqliteStorage;
use crate::HarvestError;
use futures::future::join_all;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Everything one page unit needs, shared by reference counting
#[derive(Clone)]
struct UnitContext {
    client: Arc<RateLimitedClient>,
    extractor: Arc<ArticleExtractor>,
    phone_url: Arc<str>,
    max_phone_index: u32,
}

/// Main harvest coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    extractor: Arc<ArticleExtractor>,
    client: Option<Arc<RateLimitedClient>>,
    phase: RunPhase,
}

impl Coordinator {
    /// Creates a new coordinator in the `Idle` phase
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - The listing selectors failed to compile
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        Ok(Self {
            config: Arc::new(config),
            extractor: Arc::new(ArticleExtractor::new()?),
            client: None,
            phase: RunPhase::Idle,
        })
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// The shared client, while the session is open
    pub fn client(&self) -> Option<&Arc<RateLimitedClient>> {
        self.client.as_ref()
    }

    fn advance(&mut self, to: RunPhase) -> Result<(), HarvestError> {
        if !self.phase.can_transition_to(to) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        tracing::debug!("Run phase {} -> {}", self.phase, to);
        self.phase = to;
        Ok(())
    }

    fn session(&self) -> Result<Arc<RateLimitedClient>, HarvestError> {
        if !self.phase.has_session() {
            return Err(HarvestError::SessionClosed);
        }
        self.client.clone().ok_or(HarvestError::SessionClosed)
    }

    /// Runs the whole fetch pipeline
    ///
    /// Only a failure to open the HTTP client aborts the run; every other
    /// failure is folded into the per-page outcomes.
    ///
    /// # Returns
    ///
    /// One outcome per retained page URL, in submission order
    pub async fn run(&mut self) -> Result<Vec<PageUnitResult>, HarvestError> {
        self.open_session()?;
        let urls = self.discover().await?;
        let results = self.fetch_pages(urls).await?;
        self.close()?;
        Ok(results)
    }

    /// `Idle -> SessionOpen`: builds the shared client
    pub fn open_session(&mut self) -> Result<(), HarvestError> {
        let client = RateLimitedClient::from_config(&self.config)?;
        tracing::info!(
            "HTTP session open (concurrency limit {})",
            client.concurrency_limit()
        );
        self.advance(RunPhase::SessionOpen)?;
        self.client = Some(Arc::new(client));
        Ok(())
    }

    /// `SessionOpen -> Discovering`: finds the listing pages
    ///
    /// The result is truncated to the configured page limit.
    pub async fn discover(&mut self) -> Result<Vec<String>, HarvestError> {
        self.advance(RunPhase::Discovering)?;
        let client = self.session()?;

        let discovery = PageDiscovery::new(
            &client,
            &self.config.endpoints,
            self.config.harvester.inclusive_last_page,
        );
        let mut urls = discovery.discover(&self.config.filters).await;

        let limit = self.config.harvester.pages_limit;
        if urls.len() > limit {
            tracing::info!("Truncating {} page URLs to the limit of {}", urls.len(), limit);
            urls.truncate(limit);
        }

        Ok(urls)
    }

    /// `Discovering -> Fetching -> Aggregating`: runs one unit per page
    ///
    /// All units run at once; only the client's gate bounds them. A failed
    /// or panicking unit becomes a [`PageUnitResult::Failed`] and never
    /// affects its siblings.
    pub async fn fetch_pages(
        &mut self,
        urls: Vec<String>,
    ) -> Result<Vec<PageUnitResult>, HarvestError> {
        self.advance(RunPhase::Fetching)?;

        let ctx = UnitContext {
            client: self.session()?,
            extractor: Arc::clone(&self.extractor),
            phone_url: Arc::from(self.config.endpoints.phone_url.as_str()),
            max_phone_index: self.config.harvester.max_phone_index,
        };

        tracing::info!("Fetching {} listing pages", urls.len());

        let handles = spawn_units(&urls, |url| process_page(ctx.clone(), url));

        self.advance(RunPhase::Aggregating)?;

        let results = collect_units(handles, urls).await;

        let failed = results.iter().filter(|r| r.is_failed()).count();
        let articles: usize = results.iter().map(|r| r.articles().len()).sum();
        tracing::info!(
            pages = results.len(),
            failed,
            articles,
            "Aggregated page units"
        );

        Ok(results)
    }

    /// `Aggregating -> Closed`: releases the shared client
    pub fn close(&mut self) -> Result<(), HarvestError> {
        self.advance(RunPhase::Closed)?;
        self.client = None;
        tracing::debug!("HTTP session closed");
        Ok(())
    }
}

type UnitOutcome = Result<Vec<NormalizedArticle>, HarvestError>;

/// Spawns one task per URL, each inside its own `page` span
fn spawn_units<F, Fut>(urls: &[String], unit: F) -> Vec<JoinHandle<UnitOutcome>>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = UnitOutcome> + Send + 'static,
{
    urls.iter()
        .map(|url| {
            let span = tracing::info_span!("page", url = %url);
            tokio::spawn(unit(url.clone()).instrument(span))
        })
        .collect()
}

/// Waits for every unit and pairs each outcome with its URL in submission order
async fn collect_units(
    handles: Vec<JoinHandle<UnitOutcome>>,
    urls: Vec<String>,
) -> Vec<PageUnitResult> {
    join_all(handles)
        .await
        .into_iter()
        .zip(urls)
        .map(|(joined, url)| match joined {
            Ok(Ok(articles)) => PageUnitResult::Articles(articles),
            Ok(Err(e)) => {
                tracing::error!("Page unit {} failed: {}", url, e);
                PageUnitResult::Failed {
                    url,
                    error: e.to_string(),
                }
            }
            Err(e) => {
                tracing::error!("Page unit {} aborted: {}", url, e);
                PageUnitResult::Failed {
                    url,
                    error: format!("unit aborted: {}", e),
                }
            }
        })
        .collect()
}

/// One page unit: fetch, extract, normalise, reveal phones
///
/// A non-200 page yields no articles. An absent response fails the unit.
async fn process_page(
    ctx: UnitContext,
    url: String,
) -> Result<Vec<NormalizedArticle>, HarvestError> {
    tracing::debug!("Start of processing {}", url);

    let response = ctx
        .client
        .get(&url)
        .await
        .ok_or_else(|| HarvestError::NoResponse { url: url.clone() })?;

    if !response.is_ok() {
        tracing::warn!("Response status {} at {}", response.status, url);
        return Ok(Vec::new());
    }

    let Some(body) = response.body else {
        tracing::warn!("Empty listing page at {}", url);
        return Ok(Vec::new());
    };

    let mut articles = Vec::new();
    for raw in ctx.extractor.extract(&body) {
        match normalize_article(&raw) {
            Ok(article) => articles.push(article),
            Err(rejection) => tracing::warn!("Skipping article: {}", rejection),
        }
    }

    let phones = PhoneFetcher::new(&ctx.client, &ctx.phone_url, ctx.max_phone_index);
    for article in &mut articles {
        let span = tracing::debug_span!("phones", seller_id = %article.seller_id);
        article.phones = phones.fetch(&article.seller_id).instrument(span).await;
    }

    tracing::debug!("{} articles accepted at {}", articles.len(), url);
    Ok(articles)
}

/// Runs a complete harvest operation
///
/// 1. Open the store and write the run watermark
/// 2. Run the fetch pipeline
/// 3. Deduplicate and bulk-insert the new articles
/// 4. Mark the run as completed
///
/// # Returns
///
/// * `Ok(CommitSummary)` - Harvest committed
/// * `Err(HarvestError)` - The client could not be opened or the store failed
pub async fn run_harvest(config: Config) -> Result<CommitSummary, HarvestError> {
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let mut persister = Persister::new(storage);
    persister.begin_run()?;

    let mut coordinator = Coordinator::new(config)?;
    let results = coordinator.run().await?;

    let summary = persister.commit(results)?;
    Ok(summary)
}
