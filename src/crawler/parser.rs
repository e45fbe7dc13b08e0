//! Link extraction from fetched content
//!
//! The engine consumes link extraction through the [`LinkParser`] trait; the
//! production [`HtmlLinkParser`] pulls candidate URLs out of HTML with
//! scraper selectors. Extraction is pure: no side effects, an empty result is
//! a valid outcome.

use scraper::{Html, Selector};
use url::Url;

/// Capability to extract discoverable URLs from fetched content
pub trait LinkParser: Send + Sync {
    /// Returns the URLs found in `content`, resolved against `base`
    fn extract_links(&self, base: &str, content: &str) -> Vec<String>;
}

/// HTML link extractor
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links (same page anchors)
/// - Anything that does not resolve to an http(s) URL
///
/// `rel="nofollow"` links ARE followed.
pub struct HtmlLinkParser;

impl HtmlLinkParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlLinkParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkParser for HtmlLinkParser {
    fn extract_links(&self, base: &str, content: &str) -> Vec<String> {
        let base_url = match Url::parse(base) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(base, error = %e, "unparseable base URL, no links extracted");
                return Vec::new();
            }
        };

        let document = Html::parse_document(content);
        let mut links = Vec::new();

        if let Ok(a_selector) = Selector::parse("a[href]") {
            for element in document.select(&a_selector) {
                // Skip if it has the download attribute
                if element.value().attr("download").is_some() {
                    continue;
                }

                if let Some(href) = element.value().attr("href") {
                    if let Some(absolute_url) = resolve_link(href, &base_url) {
                        links.push(absolute_url);
                    }
                }
            }
        }

        if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
            for element in document.select(&canonical_selector) {
                if let Some(href) = element.value().attr("href") {
                    if let Some(absolute_url) = resolve_link(href, &base_url) {
                        links.push(absolute_url);
                    }
                }
            }
        }

        links
    }
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.com/page";

    fn extract(html: &str) -> Vec<String> {
        HtmlLinkParser::new().extract_links(BASE, html)
    }

    #[test]
    fn test_extract_absolute_link() {
        let links = extract(r#"<html><body><a href="https://other.com/page">Link</a></body></html>"#);
        assert_eq!(links, vec!["https://other.com/page"]);
    }

    #[test]
    fn test_extract_relative_link() {
        let links = extract(r#"<html><body><a href="/other">Link</a></body></html>"#);
        assert_eq!(links, vec!["https://example.com/other"]);
    }

    #[test]
    fn test_extract_relative_path_link() {
        let links = extract(r#"<html><body><a href="other">Link</a></body></html>"#);
        assert_eq!(links, vec!["https://example.com/other"]);
    }

    #[test]
    fn test_skip_javascript_link() {
        let links = extract(r#"<html><body><a href="javascript:void(0)">Link</a></body></html>"#);
        assert!(links.is_empty());
    }

    #[test]
    fn test_skip_mailto_link() {
        let links = extract(r#"<html><body><a href="mailto:test@example.com">Email</a></body></html>"#);
        assert!(links.is_empty());
    }

    #[test]
    fn test_skip_tel_link() {
        let links = extract(r#"<html><body><a href="tel:+1234567890">Call</a></body></html>"#);
        assert!(links.is_empty());
    }

    #[test]
    fn test_skip_data_uri() {
        let links = extract(r#"<html><body><a href="data:text/html,<h1>x</h1>">Data</a></body></html>"#);
        assert!(links.is_empty());
    }

    #[test]
    fn test_skip_download_link() {
        let links = extract(r#"<html><body><a href="/file.pdf" download>Download</a></body></html>"#);
        assert!(links.is_empty());
    }

    #[test]
    fn test_skip_fragment_only() {
        let links = extract(r##"<html><body><a href="#section">Jump</a></body></html>"##);
        assert!(links.is_empty());
    }

    #[test]
    fn test_follow_nofollow_links() {
        let links = extract(r#"<html><body><a href="/page2" rel="nofollow">Link</a></body></html>"#);
        assert_eq!(links, vec!["https://example.com/page2"]);
    }

    #[test]
    fn test_extract_canonical_link() {
        let links = extract(
            r#"<html><head><link rel="canonical" href="https://example.com/canonical" /></head><body></body></html>"#,
        );
        assert!(links.contains(&"https://example.com/canonical".to_string()));
    }

    #[test]
    fn test_multiple_links() {
        let links = extract(
            r#"
            <html>
            <body>
                <a href="/page1">Link 1</a>
                <a href="/page2">Link 2</a>
                <a href="https://other.com/page3">Link 3</a>
            </body>
            </html>
        "#,
        );
        assert_eq!(links.len(), 3);
    }

    #[test]
    fn test_mixed_valid_and_invalid_links() {
        let links = extract(
            r#"
            <html>
            <body>
                <a href="/valid">Valid</a>
                <a href="javascript:alert('no')">Invalid</a>
                <a href="mailto:test@example.com">Invalid</a>
                <a href="/another-valid">Valid</a>
            </body>
            </html>
        "#,
        );
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn test_no_links_in_plain_content() {
        let links = extract("just text, no markup");
        assert!(links.is_empty());
    }

    #[test]
    fn test_unparseable_base_yields_nothing() {
        let links =
            HtmlLinkParser::new().extract_links("not a url", r#"<a href="/page">x</a>"#);
        assert!(links.is_empty());
    }
}
