//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with user agent and timeouts
//! - Resolving redirects manually with a hard bound
//! - Downloading the bytes of the landing page

use crate::config::Config;
use crate::crawler::mime::essence;
use reqwest::{header, redirect::Policy, Client, Response, StatusCode};
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// Maximum number of redirects followed for one URL
pub const MAX_REDIRECTS: usize = 5;

/// Errors that can occur while downloading a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
}

/// Result of redirect resolution
///
/// When resolution ended on a non-redirect response, that response is kept
/// so the page body can be read without a second request.
#[derive(Debug)]
pub struct Resolved {
    /// Final landing URL, or the original URL if resolution gave up
    pub url: Url,

    /// Number of redirects followed to reach `url`
    pub redirects: usize,

    landing: Option<Response>,
}

impl Resolved {
    fn gave_up(original: &Url) -> Self {
        Self {
            url: original.clone(),
            redirects: 0,
            landing: None,
        }
    }
}

/// Downloaded page content
#[derive(Debug)]
pub struct Download {
    /// URL the bytes were read from
    pub url: Url,

    /// MIME type without parameters, lowercased
    pub content_type: Option<String>,

    /// Raw body
    pub bytes: Vec<u8>,
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are never followed by the client itself; see
/// [`resolve_redirects`].
///
/// # Arguments
///
/// * `config` - The crawl configuration (user agent and timeouts)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use kgs_crawl::config::Config;
/// use kgs_crawl::crawler::build_http_client;
///
/// let config = Config::new(0, 1, "./data").unwrap();
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.header_value())
        .connect_timeout(config.fetch.connect_timeout())
        .timeout(config.fetch.read_timeout())
        .redirect(Policy::none()) // Handle redirects manually
        .gzip(true)
        .brotli(true)
        .build()
}

/// Returns true for the statuses followed as redirects (301, 302, 303)
pub fn is_followed_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND | StatusCode::SEE_OTHER
    )
}

/// Follows redirects from `url` and returns the landing URL
///
/// # Resolution Flow
///
/// 1. GET the current URL
/// 2. On 301/302/303, resolve `Location` against the current URL and repeat
/// 3. Any other status ends resolution at the current URL
///
/// Resolution is fail-open: a network error, a missing or unparsable
/// `Location`, a cycle, or more than [`MAX_REDIRECTS`] redirects all return
/// the original URL, as if it did not redirect at all.
pub async fn resolve_redirects(client: &Client, url: &Url) -> Resolved {
    let mut current = url.clone();
    let mut chain: HashSet<String> = HashSet::new();
    chain.insert(current.as_str().to_string());

    for redirects in 0..=MAX_REDIRECTS {
        let response = match client.get(current.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Couldn't resolve redirects for {}: {}", current, e);
                return Resolved::gave_up(url);
            }
        };

        let status = response.status();
        if !is_followed_redirect(status) {
            return Resolved {
                url: current,
                redirects,
                landing: Some(response),
            };
        }

        if redirects == MAX_REDIRECTS {
            tracing::warn!(
                "Too many redirects from {} (limit {}), keeping original URL",
                url,
                MAX_REDIRECTS
            );
            break;
        }

        let Some(location) = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        else {
            tracing::warn!("HTTP {} without Location header at {}", status, current);
            break;
        };

        let next = match current.join(location) {
            Ok(next) => next,
            Err(e) => {
                tracing::warn!("Invalid redirect target '{}' at {}: {}", location, current, e);
                break;
            }
        };

        if !chain.insert(next.as_str().to_string()) {
            tracing::warn!("Redirect loop detected at {}", next);
            break;
        }

        tracing::debug!("{} redirects ({}) to {}", current, status.as_u16(), next);
        current = next;
    }

    Resolved::gave_up(url)
}

/// Downloads the body of a resolved URL
///
/// The landing response from resolution is reused when available; otherwise
/// a fresh GET is sent. Only 2xx responses count as a successful download.
pub async fn download(client: &Client, resolved: Resolved) -> Result<Download, FetchError> {
    let url = resolved.url;

    let response = match resolved.landing {
        Some(response) => response,
        None => client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?,
    };

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(essence)
        .filter(|v| !v.is_empty());

    let bytes = response.bytes().await.map_err(|source| FetchError::Http {
        url: url.to_string(),
        source,
    })?;

    Ok(Download {
        url,
        content_type,
        bytes: bytes.to_vec(),
    })
}
