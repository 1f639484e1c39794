//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests of a harvest run, including:
//! - Building the shared HTTP client with the default request headers
//! - A counting gate bounding the number of in-flight requests
//! - Retry logic for timed-out GET requests
//! - Body decoding into text

use crate::config::{Config, HarvesterConfig, HttpConfig};
use crate::HarvestError;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

/// A decoded HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Final URL after redirects
    pub url: String,
    /// Decoded body, `None` when the payload was empty
    pub body: Option<String>,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Retry behaviour for GET requests
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts made after the first timed-out one
    pub max_retries: u32,
    /// Fixed pause between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &HarvesterConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Builds the HTTP transport carrying the default request headers
///
/// # Arguments
///
/// * `http` - Header configuration
/// * `search_url` - Search endpoint, used to derive `Origin` and `Referer`
/// * `timeout` - Per-request timeout
pub fn build_http_client(
    http: &HttpConfig,
    search_url: &str,
    timeout: Duration,
) -> Result<Client, HarvestError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    insert_header(&mut headers, header::ACCEPT_LANGUAGE, &http.accept_language)?;

    let origin = Url::parse(search_url)?.origin().ascii_serialization();
    insert_header(&mut headers, header::ORIGIN, &origin)?;
    insert_header(&mut headers, header::REFERER, &format!("{}/", origin))?;

    let client = Client::builder()
        .user_agent(http.user_agent.as_str())
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: &str) -> Result<(), HarvestError> {
    let value = HeaderValue::from_str(value).map_err(|e| HarvestError::InvalidHeader {
        name: name.to_string(),
        message: e.to_string(),
    })?;
    headers.insert(name, value);
    Ok(())
}

/// HTTP client shared by every request of a run
///
/// Each attempt holds exactly one gate slot for its duration. The slot is a
/// scoped permit, so it is returned on success, error and timeout alike, and a
/// retry acquires a fresh slot. Timeouts and transport failures never escape
/// as errors: they are logged and reported as an absent response.
#[derive(Debug)]
pub struct RateLimitedClient {
    client: Client,
    gate: Arc<Semaphore>,
    concurrency_limit: usize,
    retry: RetryPolicy,
}

impl RateLimitedClient {
    pub fn new(client: Client, concurrency_limit: usize, retry: RetryPolicy) -> Self {
        Self {
            client,
            gate: Arc::new(Semaphore::new(concurrency_limit)),
            concurrency_limit,
            retry,
        }
    }

    /// Builds the transport and gate from the run configuration
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let timeout = Duration::from_millis(config.harvester.request_timeout_ms);
        let client = build_http_client(&config.http, &config.endpoints.search_url, timeout)?;
        Ok(Self::new(
            client,
            config.harvester.concurrency_limit,
            RetryPolicy::from_config(&config.harvester),
        ))
    }

    /// Number of gate slots currently free
    pub fn available_slots(&self) -> usize {
        self.gate.available_permits()
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Issues a GET request, retrying timed-out attempts
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Any HTTP status | Returned as is |
    /// | Timeout | Retry up to `max_retries` times with a fixed delay |
    /// | Other transport failure | Immediate → `None` |
    pub async fn get(&self, url: &str) -> Option<HttpResponse> {
        let mut retries = 0;
        loop {
            match self.attempt(self.client.get(url), url).await {
                Ok(response) => return Some(response),
                Err(HarvestError::Timeout { .. }) if retries < self.retry.max_retries => {
                    retries += 1;
                    tracing::warn!("Timeout at {}. Retry #{}", url, retries);
                    tokio::time::sleep(self.retry.delay).await;
                }
                Err(e) => {
                    tracing::error!("GET {} failed after {} retries: {}", url, retries, e);
                    return None;
                }
            }
        }
    }

    /// Issues a single form-encoded POST request; timeouts are not retried
    pub async fn post_form(&self, url: &str, form: &[(String, String)]) -> Option<HttpResponse> {
        match self.attempt(self.client.post(url).form(form), url).await {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::error!("POST {} failed: {}", url, e);
                None
            }
        }
    }

    /// Sends one request while holding one gate slot
    async fn attempt(&self, request: RequestBuilder, url: &str) -> Result<HttpResponse, HarvestError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| HarvestError::GateClosed)?;

        let response = request.send().await.map_err(|e| classify(e, url))?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|e| classify(e, url))?;

        tracing::trace!("{} {} ({} bytes)", status, final_url, body.len());

        Ok(HttpResponse {
            status,
            url: final_url,
            body: if body.is_empty() { None } else { Some(body) },
        })
    }
}

fn classify(error: reqwest::Error, url: &str) -> HarvestError {
    if error.is_timeout() {
        HarvestError::Timeout {
            url: url.to_string(),
        }
    } else {
        HarvestError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
