//! HTML helpers for parser implementations
//!
//! Parsers receive the raw response; these helpers cover the common cases:
//! - Links to follow (from <a> tags and canonical links)
//! - Page title
//! - Text and attribute extraction by CSS selector

use crate::crawler::parser::ParseError;
use scraper::{Html, Selector};
use url::Url;

/// Compiles a CSS selector, mapping failures into [`ParseError::Selector`]
pub fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|e| ParseError::Selector(format!("{}: {}", css, e)))
}

/// Extracts all followable links from the document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links (same page anchors)
///
/// Links are returned as absolute strings in document order. They are not
/// normalized or deduplicated; that happens when they are followed.
///
/// # Example
///
/// ```
/// use sumi_spider::crawler::html::extract_links;
/// use scraper::Html;
/// use url::Url;
///
/// let document = Html::parse_document(r#"<a href="/page2">Next</a>"#);
/// let base = Url::parse("http://example.test/page1").unwrap();
/// assert_eq!(extract_links(&document, &base), vec!["http://example.test/page2"]);
/// ```
pub fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(absolute) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                links.push(absolute);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(absolute) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                links.push(absolute);
            }
        }
    }

    links
}

/// Resolves an href for link extraction, or `None` if it should be skipped
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute.to_string()),
        _ => None,
    }
}

/// Returns the trimmed `<title>` text, if present and non-empty
pub fn title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Collects the trimmed text of every element matching `css`
pub fn select_text(document: &Html, css: &str) -> Result<Vec<String>, ParseError> {
    let selector = selector(css)?;
    Ok(document
        .select(&selector)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .collect())
}

/// Collects attribute `attr` of every element matching `css` that carries it
pub fn select_attr(document: &Html, css: &str, attr: &str) -> Result<Vec<String>, ParseError> {
    let selector = selector(css)?;
    Ok(document
        .select(&selector)
        .filter_map(|element| element.value().attr(attr))
        .map(str::to_string)
        .collect())
}
