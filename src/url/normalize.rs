use crate::{UrlError, UrlResult};
use url::{ParseError, Url};

/// Normalizes a URL into its canonical form
///
/// # Normalization Steps
///
/// 1. Parse the URL; a string without a scheme is retried as `http://<input>`
/// 2. Reject anything that is not HTTP(S) or has no host
/// 3. Remove the fragment (everything after #)
/// 4. Lowercase the whole serialized URL
///
/// The canonical form is the sole identity used for deduplication, and
/// normalizing an already canonical URL returns it unchanged.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(String)` - The canonical URL
/// * `Err(UrlError)` - The input cannot be turned into a crawlable URL
///
/// # Examples
///
/// ```
/// use corpus_crawler::url::normalize_url;
///
/// let url = normalize_url("HTTPS://Example.COM/Page#intro").unwrap();
/// assert_eq!(url, "https://example.com/page");
///
/// let url = normalize_url("example.com/a").unwrap();
/// assert_eq!(url, "http://example.com/a");
/// ```
pub fn normalize_url(url_str: &str) -> UrlResult<String> {
    let mut url = parse_with_default_scheme(url_str.trim())?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    Ok(url.as_str().to_lowercase())
}

/// Resolves a possibly relative href against a base URL and normalizes it
///
/// Returns None if the link should be excluded:
/// - empty hrefs and fragment-only anchors
/// - javascript:, mailto:, tel: and data: links
/// - anything that does not resolve to an HTTP(S) URL
pub fn resolve_url(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let joined = match base {
        Some(base) => base.join(href).ok()?,
        None => return normalize_url(href).ok(),
    };

    normalize_url(joined.as_str()).ok()
}

fn parse_with_default_scheme(input: &str) -> UrlResult<Url> {
    // A bare path would otherwise have its first segment read as a host.
    if input.starts_with('/') {
        return Err(UrlError::Parse(format!("{}: missing host", input)));
    }

    match Url::parse(input) {
        Ok(url) => Ok(url),
        Err(ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("http://{}", input))
            .map_err(|e| UrlError::Parse(format!("{}: {}", input, e))),
        Err(e) => Err(UrlError::Parse(format!("{}: {}", input, e))),
    }
}
