use crate::UrlError;
use url::Url;

/// List of tracking query parameters to remove during normalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
];

/// Normalizes an absolute URL into the form that gets fetched
///
/// # Normalization Steps
///
/// 1. Reject schemes other than http and https
/// 2. Require a host (lowercased by the parser)
/// 3. Empty path becomes `/`; dot segments are already resolved by the parser
/// 4. Remove fragment (everything after #)
///
/// The query string is left exactly as linked. Parameter order and tracking
/// parameters only matter for deduplication, see [`dedup_key`].
///
/// # Examples
///
/// ```
/// use sumi_spider::url::normalize_url;
/// use url::Url;
///
/// let url = Url::parse("http://EXAMPLE.test/search?page&q=a%20b#top").unwrap();
/// assert_eq!(normalize_url(url).unwrap().as_str(), "http://example.test/search?page&q=a%20b");
/// ```
pub fn normalize_url(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingDomain),
    }

    if url.path().is_empty() {
        url.set_path("/");
    }

    url.set_fragment(None);

    Ok(url)
}

/// Returns the key two spellings of the same page share
///
/// Tracking parameters are dropped and the rest are sorted by key. Query
/// segments are compared as raw text, so `?page` and `?page=` or `%20` and
/// `+` stay distinct.
///
/// ```
/// use sumi_spider::url::dedup_key;
/// use url::Url;
///
/// let url = Url::parse("http://example.test/list?b=2&a=1&utm_source=x").unwrap();
/// assert_eq!(dedup_key(&url), "http://example.test/list?a=1&b=2");
/// ```
pub fn dedup_key(url: &Url) -> String {
    let mut key = url.clone();
    key.set_fragment(None);

    let segments = url.query().map(filter_and_sort_query_segments);
    match segments {
        Some(segments) if !segments.is_empty() => key.set_query(Some(&segments.join("&"))),
        _ => key.set_query(None),
    }

    key.into()
}

/// Filters out tracking parameters and sorts the remaining raw segments
fn filter_and_sort_query_segments(query: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .filter(|segment| !is_tracking_param(segment_key(segment)))
        .collect();

    // Stable sort keeps repeated keys in their original order
    segments.sort_by(|a, b| segment_key(a).cmp(segment_key(b)));

    segments
}

fn segment_key(segment: &str) -> &str {
    segment.split_once('=').map_or(segment, |(key, _)| key)
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
