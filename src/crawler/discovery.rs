//! Page discovery
//!
//! Issues the filtered search request and derives the listing page URLs
//! from the pager of the result document.

use crate::config::{EndpointConfig, FilterConfig};
use crate::crawler::fetcher::RateLimitedClient;
use scraper::{Html, Selector};
use url::Url;

/// Builds the form-encoded search payload
///
/// Zero and empty filter values are sent as empty fields. `damaged` and
/// "no accident" are mutually exclusive.
pub fn search_form(filters: &FilterConfig, category_id: u32) -> Vec<(String, String)> {
    fn bound(value: u64) -> String {
        if value == 0 {
            String::new()
        } else {
            value.to_string()
        }
    }

    let flag = |set: bool| if set { "1".to_string() } else { String::new() };

    vec![
        ("search[category_id]".to_string(), category_id.to_string()),
        ("search[filter_enum_make]".to_string(), String::new()),
        ("search[filter_float_price:from]".to_string(), bound(filters.value_min)),
        ("search[filter_float_price:to]".to_string(), bound(filters.value_max)),
        ("search[filter_float_year:from]".to_string(), filters.year_from.to_string()),
        (
            "search[filter_float_year:to]".to_string(),
            filters.effective_year_to().to_string(),
        ),
        ("search[filter_float_mileage:from]".to_string(), bound(filters.mileage_min)),
        ("search[filter_float_mileage:to]".to_string(), bound(filters.mileage_max)),
        ("search[filter_enum_fuel_type]".to_string(), filters.fuel_type.trim().to_string()),
        ("search[filter_enum_damaged]".to_string(), flag(filters.damaged)),
        ("search[filter_enum_no_accident]".to_string(), flag(!filters.damaged)),
    ]
}

/// Reads the total page count from the pager of a result document
///
/// The count is the second-to-last pager entry; the last one is the "next"
/// control. Returns `None` when the pager is absent or unreadable.
pub fn page_count(body: &str) -> Option<u32> {
    let document = Html::parse_document(body);
    let items = Selector::parse("ul.om-pager.rel > li").ok()?;
    let label = Selector::parse("a > span").ok()?;

    let entries: Vec<_> = document.select(&items).collect();
    if entries.len() < 2 {
        return None;
    }

    entries[entries.len() - 2]
        .select(&label)
        .next()
        .map(|span| span.text().collect::<String>())
        .and_then(|text| text.trim().parse().ok())
}

/// Builds the listing page URLs from the resolved search URL
///
/// Pages `1..count` are emitted, or `1..=count` when `inclusive_last` is set.
pub fn page_urls(template: &Url, count: u32, inclusive_last: bool) -> Vec<String> {
    let last = if inclusive_last {
        count
    } else {
        count.saturating_sub(1)
    };

    (1..=last)
        .map(|page| {
            let mut url = template.clone();
            url.query_pairs_mut().append_pair("page", &page.to_string());
            url.to_string()
        })
        .collect()
}

/// Discovers the listing pages of one filtered search
pub struct PageDiscovery<'a> {
    client: &'a RateLimitedClient,
    endpoints: &'a EndpointConfig,
    inclusive_last_page: bool,
}

impl<'a> PageDiscovery<'a> {
    pub fn new(
        client: &'a RateLimitedClient,
        endpoints: &'a EndpointConfig,
        inclusive_last_page: bool,
    ) -> Self {
        Self {
            client,
            endpoints,
            inclusive_last_page,
        }
    }

    /// Issues the search request and returns the ordered page URLs
    ///
    /// A failed request or non-200 status is logged as an error; a missing
    /// pager is the normal outcome of an empty search. Both yield no URLs.
    pub async fn discover(&self, filters: &FilterConfig) -> Vec<String> {
        let form = search_form(filters, self.endpoints.category_id);

        let response = match self.client.post_form(&self.endpoints.search_url, &form).await {
            Some(response) => response,
            None => {
                tracing::error!("Discovery failed: no response from search endpoint");
                return Vec::new();
            }
        };

        if !response.is_ok() {
            tracing::error!("Discovery failed: response status {}", response.status);
            return Vec::new();
        }

        let template = match Url::parse(&response.url) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Discovery failed: invalid resolved URL {}: {}", response.url, e);
                return Vec::new();
            }
        };

        let count = match response.body.as_deref().and_then(page_count) {
            Some(count) => count,
            None => {
                tracing::warn!("No pager found on the search result, no pages to visit");
                return Vec::new();
            }
        };

        let urls = page_urls(&template, count, self.inclusive_last_page);
        tracing::info!(pages = count, urls = urls.len(), template = %template, "Discovered listing pages");
        urls
    }
}
