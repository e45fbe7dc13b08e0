use crate::{UrlError, UrlResult};
use url::Url;

/// Normalizes a raw URL string into its canonical crawlable form
///
/// # Normalization Rules
///
/// - Leading/trailing whitespace is trimmed
/// - Only `http` and `https` schemes are accepted
/// - The URL must have a host
/// - The fragment is stripped (`/page#top` and `/page` are the same resource)
/// - The host is lowercased and default ports are dropped (both handled by
///   the `url` crate's parser)
///
/// # Example
///
/// ```
/// use kumo_crawl::url::normalize_url;
///
/// let url = normalize_url("HTTP://Example.COM:80/page#section").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/page");
/// ```
pub fn normalize_url(raw: &str) -> UrlResult<Url> {
    let trimmed = raw.trim();

    let mut url =
        Url::parse(trimmed).map_err(|e| UrlError::Parse(format!("{}: {}", trimmed, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::InvalidScheme(other.to_string())),
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    Ok(url)
}
