//! Seller phone lookup through the indexed phone-reveal endpoint

use crate::crawler::fetcher::RateLimitedClient;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct PhoneReveal {
    value: String,
}

/// Reveals the phone numbers of one seller
pub struct PhoneFetcher<'a> {
    client: &'a RateLimitedClient,
    base_url: String,
    max_index: u32,
}

impl<'a> PhoneFetcher<'a> {
    /// # Arguments
    ///
    /// * `client` - The shared rate-limited client
    /// * `base_url` - Endpoint prefix; `<seller_id>/<index>/` is appended
    /// * `max_index` - Hard upper bound on the number of reveal requests
    pub fn new(client: &'a RateLimitedClient, base_url: &str, max_index: u32) -> Self {
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        Self {
            client,
            base_url,
            max_index,
        }
    }

    pub fn reveal_url(&self, seller_id: &str, index: u32) -> String {
        format!("{}{}/{}/", self.base_url, seller_id, index)
    }

    /// Fetches phones at index 0, 1, ... until the first non-200 response
    ///
    /// An absent response or an undecodable body also ends the sequence.
    /// Spaces are stripped from each number.
    pub async fn fetch(&self, seller_id: &str) -> Vec<String> {
        let mut phones = Vec::new();

        for index in 0..self.max_index {
            let url = self.reveal_url(seller_id, index);

            let response = match self.client.get(&url).await {
                Some(response) => response,
                None => {
                    tracing::debug!("Phone lookup for seller {} stopped at index {}", seller_id, index);
                    return phones;
                }
            };

            if !response.is_ok() {
                tracing::trace!("Phone sequence of seller {} ends at index {}", seller_id, index);
                return phones;
            }

            let reveal: PhoneReveal = match response
                .body
                .as_deref()
                .map(serde_json::from_str::<PhoneReveal>)
                .transpose()
            {
                Ok(Some(reveal)) => reveal,
                Ok(None) => {
                    tracing::warn!("Empty phone payload at {}", url);
                    return phones;
                }
                Err(e) => {
                    tracing::warn!("Undecodable phone payload at {}: {}", url, e);
                    return phones;
                }
            };

            phones.push(reveal.value.chars().filter(|c| *c != ' ').collect());
        }

        tracing::warn!(
            "Phone lookup for seller {} hit the cap of {} entries",
            seller_id,
            self.max_index
        );
        phones
    }
}
