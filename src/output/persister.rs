//! Deduplication and persistence of a run's aggregated results

use crate::models::{NormalizedArticle, PageUnitResult};
use crate::state::RunMeta;
use crate::storage::{Storage, StorageResult};
use chrono::Utc;
use std::collections::HashSet;

/// Counters of one commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// New articles written to the store
    pub inserted: usize,
    /// Articles dropped because an earlier one of the same run had the same id
    pub duplicates_in_run: usize,
    /// Articles dropped because the store already holds their id
    pub already_stored: usize,
    /// Page units that produced no outcome
    pub failed_units: usize,
}

/// Writes the run marker and the previously unseen articles of a run
pub struct Persister<S: Storage> {
    storage: S,
    meta: Option<RunMeta>,
}

impl<S: Storage> Persister<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            meta: None,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Stamps the run watermark before any fetching starts
    ///
    /// The marker is written with `status = false` so an aborted run stays
    /// visible as incomplete.
    pub fn begin_run(&mut self) -> StorageResult<RunMeta> {
        let mut meta = self.storage.get_or_create_meta()?;
        meta.start(Utc::now());
        self.storage.save_meta(&meta)?;

        tracing::info!(
            "Run watermark set to {}",
            meta.last_start
                .as_ref()
                .map(crate::state::to_db_timestamp)
                .unwrap_or_default()
        );

        self.meta = Some(meta.clone());
        Ok(meta)
    }

    /// Flattens, deduplicates and stores the outcomes of a run
    ///
    /// Articles are considered in page submission order then block order;
    /// the first occurrence of an id wins. All new articles go into a single
    /// bulk insert, after which the run marker is flagged as completed.
    pub fn commit(&mut self, results: Vec<PageUnitResult>) -> StorageResult<CommitSummary> {
        let mut summary = CommitSummary::default();
        let estimate: usize = results.iter().map(|r| r.articles().len()).sum();
        tracing::info!("Committing harvest of ~{} articles", estimate);

        let mut seen = HashSet::new();
        let mut fresh: Vec<NormalizedArticle> = Vec::new();

        for result in results {
            let articles = match result {
                PageUnitResult::Articles(articles) => articles,
                PageUnitResult::Failed { url, error } => {
                    tracing::debug!("Skipping failed unit {}: {}", url, error);
                    summary.failed_units += 1;
                    continue;
                }
            };

            for article in articles {
                if !seen.insert(article.id.clone()) {
                    summary.duplicates_in_run += 1;
                    continue;
                }
                if self.storage.contains_article(&article.id)? {
                    summary.already_stored += 1;
                    continue;
                }
                fresh.push(article);
            }
        }

        summary.inserted = self.storage.bulk_insert(&fresh)?;

        let mut meta = match self.meta.take() {
            Some(meta) => meta,
            None => self.storage.get_or_create_meta()?,
        };
        meta.finish();
        self.storage.save_meta(&meta)?;

        tracing::info!(
            inserted = summary.inserted,
            duplicates = summary.duplicates_in_run,
            already_stored = summary.already_stored,
            failed_units = summary.failed_units,
            "Harvest committed"
        );

        Ok(summary)
    }
}
