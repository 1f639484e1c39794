use serde::Deserialize;

/// Main configuration structure for Moto-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub harvester: HarvesterConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub endpoints: EndpointConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    pub output: OutputConfig,
}

/// Harvest pipeline limits and retry policy
#[derive(Debug, Clone, Deserialize)]
pub struct HarvesterConfig {
    /// Maximum number of simultaneous in-flight HTTP requests
    #[serde(rename = "concurrency-limit", default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    /// Maximum number of listing pages fetched per run
    #[serde(rename = "pages-limit", default = "default_pages_limit")]
    pub pages_limit: usize,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Additional GET attempts after a timeout
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between GET attempts (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Upper bound on the phone-reveal index
    #[serde(rename = "max-phone-index", default = "default_max_phone_index")]
    pub max_phone_index: u32,

    /// Also emit a URL for the last page reported by the pager
    #[serde(rename = "inclusive-last-page", default)]
    pub inclusive_last_page: bool,
}

/// Default request headers
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,
}

/// Remote endpoints of the classifieds site
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    /// Search form target; its resolved URL becomes the page template
    #[serde(rename = "search-url", default = "default_search_url")]
    pub search_url: String,

    /// Phone-reveal prefix, `<seller_id>/<index>/` is appended
    #[serde(rename = "phone-url", default = "default_phone_url")]
    pub phone_url: String,

    /// Search category (29 = passenger cars)
    #[serde(rename = "category-id", default = "default_category_id")]
    pub category_id: u32,
}

/// Search filter bundle; zero or empty values mean "no bound"
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    #[serde(rename = "value-min", default)]
    pub value_min: u64,

    #[serde(rename = "value-max", default)]
    pub value_max: u64,

    #[serde(rename = "year-from", default = "default_year_from")]
    pub year_from: i32,

    /// Defaults to the current calendar year
    #[serde(rename = "year-to", default)]
    pub year_to: Option<i32>,

    #[serde(rename = "mileage-min", default)]
    pub mileage_min: u64,

    #[serde(rename = "mileage-max", default)]
    pub mileage_max: u64,

    #[serde(rename = "fuel-type", default)]
    pub fuel_type: String,

    /// Include damaged cars; clears the no-accident filter
    #[serde(default)]
    pub damaged: bool,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_concurrency_limit() -> usize {
    50
}

fn default_pages_limit() -> usize {
    500
}

fn default_request_timeout_ms() -> u64 {
    15_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2_000
}

fn default_max_phone_index() -> u32 {
    50
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/61.0.3163.100 Safari/537.36 OPR/48.0.2685.50"
        .to_string()
}

fn default_accept_language() -> String {
    "pl-PL,pl;q=0.8,en-US;q=0.6,en;q=0.4".to_string()
}

fn default_search_url() -> String {
    "https://www.otomoto.pl/oferty/".to_string()
}

fn default_phone_url() -> String {
    "https://www.otomoto.pl/ajax/misc/contact/multi_phone/".to_string()
}

fn default_category_id() -> u32 {
    29
}

fn default_year_from() -> i32 {
    1990
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: default_concurrency_limit(),
            pages_limit: default_pages_limit(),
            request_timeout_ms: default_request_timeout_ms(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            max_phone_index: default_max_phone_index(),
            inclusive_last_page: false,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
            phone_url: default_phone_url(),
            category_id: default_category_id(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            value_min: 0,
            value_max: 0,
            year_from: default_year_from(),
            year_to: None,
            mileage_min: 0,
            mileage_max: 0,
            fuel_type: String::new(),
            damaged: false,
        }
    }
}

impl FilterConfig {
    /// Upper production year, falling back to the current year
    pub fn effective_year_to(&self) -> i32 {
        use chrono::Datelike;
        self.year_to.unwrap_or_else(|| chrono::Utc::now().year())
    }
}
