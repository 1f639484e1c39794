//! Advertisement identity derived from its link

use once_cell::sync::Lazy;
use regex::Regex;

static SELLER_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^.*ID(\w+)\.html").unwrap());

/// Removes the fragment (everything after `#`) from a link
///
/// # Examples
///
/// ```
/// use moto_harvest::canonical_link;
///
/// assert_eq!(
///     canonical_link("https://example.com/oferta/audi-ID6A.html#gallery"),
///     "https://example.com/oferta/audi-ID6A.html"
/// );
/// ```
pub fn canonical_link(link: &str) -> &str {
    link.split('#').next().unwrap_or(link)
}

/// Computes the stable identity of an advertisement
///
/// The identity is the hex MD5 digest of the canonical link, so links that
/// only differ by fragment collapse to the same identity.
pub fn article_id(link: &str) -> String {
    format!("{:x}", md5::compute(canonical_link(link).as_bytes()))
}

/// Extracts the seller identifier embedded as `ID<token>.html` in a link
pub fn seller_id(link: &str) -> Option<String> {
    SELLER_ID
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
