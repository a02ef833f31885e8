//! URL handling module for Sumi-Spider
//!
//! This module provides link resolution, URL normalization and the
//! per-run seen-set used for deduplication.

mod dedup;
mod normalize;

pub use dedup::SeenSet;
pub use normalize::{dedup_key, normalize_url};

use crate::{UrlError, UrlResult};
use url::Url;

/// Resolves a possibly relative link against a base URL
///
/// The result is normalized for fetching: the fragment is dropped and the
/// query string is kept as linked.
///
/// # Arguments
///
/// * `base` - The page the link was found on
/// * `link` - An absolute or relative link (`/page2`, `?page=3`, `next.html`)
///
/// # Returns
///
/// * `Ok(Url)` - Absolute URL to fetch
/// * `Err(UrlError::Empty)` - The link is blank or a bare `#`
/// * `Err(UrlError)` - Malformed link or unsupported scheme
///
/// # Examples
///
/// ```
/// use sumi_spider::url::resolve;
/// use url::Url;
///
/// let base = Url::parse("http://example.test/page1").unwrap();
/// let next = resolve(&base, "/page2").unwrap();
/// assert_eq!(next.as_str(), "http://example.test/page2");
/// ```
pub fn resolve(base: &Url, link: &str) -> UrlResult<Url> {
    if is_blank_link(link) {
        return Err(UrlError::Empty);
    }

    let joined = base
        .join(link.trim())
        .map_err(|e| UrlError::Parse(format!("{}: {}", link, e)))?;

    normalize_url(joined)
}

/// Parses and normalizes an absolute URL such as a seed
pub fn parse_absolute(url_str: &str) -> UrlResult<Url> {
    if is_blank_link(url_str) {
        return Err(UrlError::Empty);
    }

    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_url(url)
}

/// Returns true for links that mean "no further link"
pub fn is_blank_link(link: &str) -> bool {
    let link = link.trim();
    link.is_empty() || link == "#"
}
