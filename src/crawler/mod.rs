//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The depth/hop bounded frontier
//! - HTTP fetching with manual redirect resolution
//! - Content parsing and language filtering
//! - Overall crawl coordination

mod coordinator;
pub mod fetcher;
pub mod frontier;
pub mod language;
pub mod mime;
pub mod parser;

pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, download, resolve_redirects, Download, FetchError, Resolved};
pub use frontier::{Frontier, FrontierError, PendingUrl, PushOutcome};
pub use language::{LanguageDetector, LanguageFilter, WhatlangDetector};
pub use parser::{
    ContentParser, DefaultParserRegistry, HtmlParser, ParseError, ParserRegistry, PlainTextParser,
    Resource,
};

use crate::config::Config;
use crate::output::CrawlReport;
use crate::CrawlError;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use url::Url;

/// Requests a running crawl to stop
///
/// Cancellation is checked before each pop: no new URL is started once it is
/// set, and URLs already in flight run to completion so that `ids.txt` stays
/// consistent with the files on disk.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs a complete crawl with default settings
///
/// This is the main programmatic entry point. It will:
/// 1. Parse the seed URL
/// 2. Build a configuration from the given limits
/// 3. Clear the output directory of previous artifacts
/// 4. Crawl until the frontier is empty
/// 5. Write `ids.txt`
///
/// # Arguments
///
/// * `seed` - Absolute URL the crawl starts from
/// * `max_hops` - Maximum number of host group changes along a link path
/// * `max_depth` - Maximum number of link steps from the seed
/// * `output_dir` - Data directory receiving `original/`, `parsed/`, `links/` and `ids.txt`
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed
/// * `Err(CrawlError)` - Invalid seed, unusable directory or failed index write
pub async fn crawl(
    seed: &str,
    max_hops: u32,
    max_depth: u32,
    output_dir: impl Into<PathBuf>,
) -> crate::Result<CrawlReport> {
    let seed_url = Url::parse(seed).map_err(|source| CrawlError::InvalidSeed {
        url: seed.to_string(),
        source,
    })?;

    let config = Config::new(max_hops, max_depth, output_dir)?;
    let coordinator = Coordinator::new(config)?;
    coordinator.run(&seed_url).await
}
