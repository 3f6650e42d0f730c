use url::{Position, Url};

/// Scheme every canonical URL is rewritten to
const CANONICAL_SCHEME: &str = "http";

/// Normalizes a URL string into its canonical comparison form
///
/// # Normalization Steps
///
/// 1. Parse the URL; on failure log a warning and return the input unchanged
/// 2. Remove the fragment (everything after #)
/// 3. Rewrite `https` to `http`
/// 4. Remove trailing slashes from the path (the root path becomes empty)
///
/// Host case and percent-encoding are canonicalized by the parser itself.
/// The result is only a comparison key: fetching always uses the URL as it
/// was discovered.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// The canonical form, or `url_str` itself when it cannot be parsed
///
/// # Examples
///
/// ```
/// use kgs_crawl::url::normalize;
///
/// assert_eq!(normalize("https://Example.com/page/#top"), "http://example.com/page");
/// assert_eq!(normalize("http://example.com/"), "http://example.com");
/// ```
pub fn normalize(url_str: &str) -> String {
    match Url::parse(url_str) {
        Ok(url) => normalize_url(&url),
        Err(e) => {
            tracing::warn!("Couldn't normalize URL {}: {}", url_str, e);
            url_str.to_string()
        }
    }
}

/// Normalizes an already parsed URL
///
/// Same rules as [`normalize`], but infallible since parsing already happened.
pub fn normalize_url(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);

    if url.scheme() == "https" {
        // Switching between special schemes cannot fail
        let _ = url.set_scheme(CANONICAL_SCHEME);
    }

    let path = url.path().trim_end_matches('/');

    let mut canonical = String::with_capacity(url.as_str().len());
    canonical.push_str(&url[..Position::AfterPort]);
    canonical.push_str(path);
    if let Some(query) = url.query() {
        canonical.push('?');
        canonical.push_str(query);
    }

    canonical
}
