//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Preparing the output directory
//! - Dispatching frontier entries to a pool of workers
//! - Driving each URL through redirect check, download, parsing and language filtering
//! - Committing accepted pages and pushing their links back into the frontier
//! - Handling cancellation and writing the final ID table

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, download, resolve_redirects};
use crate::crawler::frontier::{Frontier, FrontierError, PendingUrl};
use crate::crawler::language::{LanguageDetector, LanguageFilter, WhatlangDetector};
use crate::crawler::mime::choose_extension;
use crate::crawler::parser::{DefaultParserRegistry, ParseError, ParserRegistry, Resource};
use crate::crawler::CancelHandle;
use crate::output::CrawlReport;
use crate::state::{Outcome, PageState, RejectReason};
use crate::storage::{PersistenceSink, StagedPage, StorageError};
use crate::url::normalize_url;
use parking_lot::Mutex;
use reqwest::Client;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinSet;
use url::Url;

/// State shared by all workers of one crawl run
struct CrawlContext {
    frontier: Mutex<Frontier>,
    sink: PersistenceSink,
    client: Client,
    parsers: Arc<dyn ParserRegistry>,
    language: LanguageFilter,
}

/// Main crawler coordinator structure
///
/// One coordinator may run several crawls one after another; every call to
/// [`run`](Self::run) gets a fresh frontier.
pub struct Coordinator {
    config: Arc<Config>,
    client: Client,
    parsers: Arc<dyn ParserRegistry>,
    detector: Arc<dyn LanguageDetector>,
    cancel: CancelHandle,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// The built-in HTML/plain text parsers and the `whatlang` detector are
    /// used unless replaced with [`with_parser_registry`](Self::with_parser_registry)
    /// or [`with_language_detector`](Self::with_language_detector).
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CrawlError)` - Failed to build the HTTP client
    pub fn new(config: Config) -> crate::Result<Self> {
        let client = build_http_client(&config)?;

        Ok(Self {
            config: Arc::new(config),
            client,
            parsers: Arc::new(DefaultParserRegistry),
            detector: Arc::new(WhatlangDetector),
            cancel: CancelHandle::new(),
        })
    }

    /// Replaces the parser registry
    pub fn with_parser_registry(mut self, registry: impl ParserRegistry + 'static) -> Self {
        self.parsers = Arc::new(registry);
        self
    }

    /// Replaces the language detector
    pub fn with_language_detector(mut self, detector: impl LanguageDetector + 'static) -> Self {
        self.detector = Arc::new(detector);
        self
    }

    /// Returns a handle that stops the crawl between pops
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the main crawl loop
    ///
    /// 1. Prepares the data directory (fatal on failure)
    /// 2. Pushes the seed at depth 0, hops 0
    /// 3. Keeps up to `workers` URLs in flight until the frontier drains or
    ///    the crawl is cancelled; in-flight URLs always finish
    /// 4. Writes `ids.txt` (fatal on failure)
    pub async fn run(&self, seed: &Url) -> crate::Result<CrawlReport> {
        let start_time = Instant::now();
        let data_dir = self.config.output.data_dir.clone();
        let workers = self.config.crawler.workers.max(1) as usize;

        let sink = PersistenceSink::new(&data_dir);
        sink.prepare()?;

        let ctx = Arc::new(CrawlContext {
            frontier: Mutex::new(Frontier::new(
                self.config.crawler.max_depth,
                self.config.crawler.max_hops,
            )),
            sink,
            client: self.client.clone(),
            parsers: Arc::clone(&self.parsers),
            language: LanguageFilter::new(
                self.config.language.target.clone(),
                Arc::clone(&self.detector),
            ),
        });

        ctx.frontier.lock().push(seed, 0, 0);

        tracing::info!(
            "Starting crawl from {} (max depth {}, max hops {}, {} workers) into {}",
            seed,
            self.config.crawler.max_depth,
            self.config.crawler.max_hops,
            workers,
            data_dir.display()
        );

        let mut report = CrawlReport::new(&data_dir);
        let mut in_flight_tasks = JoinSet::new();

        loop {
            if !report.cancelled && self.cancel.is_cancelled() {
                tracing::info!(
                    "Crawl cancelled, waiting for {} in-flight pages",
                    in_flight_tasks.len()
                );
                report.cancelled = true;
            }

            // Fill worker pool
            while !report.cancelled && in_flight_tasks.len() < workers {
                let next = ctx.frontier.lock().pop();
                let Some(pending) = next else {
                    break;
                };

                let task_ctx = Arc::clone(&ctx);
                in_flight_tasks.spawn(async move { process_url(&task_ctx, pending).await });
            }

            // Collect one completed task; none left means the crawl is done
            match in_flight_tasks.join_next().await {
                Some(Ok(outcome)) => {
                    report.record(&outcome);

                    let visited = report.visited();
                    if visited % 50 == 0 {
                        let frontier = ctx.frontier.lock();
                        tracing::info!(
                            "Progress: {} visited, {} accepted, {} queued, {:.2} pages/sec",
                            visited,
                            report.accepted,
                            frontier.pending_len(),
                            visited as f64 / start_time.elapsed().as_secs_f64()
                        );
                    }
                }
                Some(Err(e)) => {
                    tracing::error!("Worker task failed: {}", e);
                }
                None => break,
            }
        }

        {
            let frontier = ctx.frontier.lock();
            ctx.sink.write_ids(frontier.index())?;
        }

        report.elapsed = start_time.elapsed();
        tracing::info!(
            "Crawl finished: {} accepted, {} rejected in {:?}",
            report.accepted,
            report.rejected_total(),
            report.elapsed
        );

        Ok(report)
    }
}

/// Tracks the page state of one URL and logs every transition
struct Progress<'a> {
    url: &'a Url,
    state: PageState,
}

impl<'a> Progress<'a> {
    fn new(url: &'a Url) -> Self {
        Self {
            url,
            state: PageState::Popped,
        }
    }

    fn advance(&mut self, next: PageState) {
        if !self.state.can_transition_to(next) {
            tracing::warn!(
                "Unexpected transition {} -> {} for {}",
                self.state,
                next,
                self.url
            );
        }
        tracing::debug!("{}: {} -> {}", self.url, self.state, next);
        self.state = next;
    }
}

/// Result of running a parser on a blocking thread
enum ParseStage {
    NoParser,
    Failed(ParseError),
    Parsed { text: String, links: Vec<Url> },
}

#[derive(Debug, Error)]
enum CommitError {
    #[error(transparent)]
    Frontier(#[from] FrontierError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Drives one popped URL to a terminal state
///
/// Nothing in here can fail the crawl: every problem becomes a rejection.
async fn process_url(ctx: &CrawlContext, pending: PendingUrl) -> Outcome {
    let url = pending.url.clone();
    let mut progress = Progress::new(&url);

    tracing::info!(
        "Processing {} (depth {}, hops {})",
        url,
        pending.depth,
        pending.hops
    );

    // Redirects
    let resolved = resolve_redirects(&ctx.client, &url).await;
    progress.advance(PageState::RedirectChecked);

    if normalize_url(&resolved.url) != normalize_url(&url) {
        tracing::info!("Redirect from {} to {}", url, resolved.url);
        ctx.frontier
            .lock()
            .push(&resolved.url, pending.depth, pending.hops);
        return reject(ctx, &mut progress, None, RejectReason::Redirected);
    }

    // Download
    let page = match download(&ctx.client, resolved).await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!("Download failed for {}: {}", url, e);
            return reject(ctx, &mut progress, None, RejectReason::DownloadFailed);
        }
    };

    let extension = choose_extension(&page.url, page.content_type.as_deref());
    let mut staged = match ctx.sink.stage_original(&extension, &page.bytes).await {
        Ok(staged) => staged,
        Err(e) => {
            tracing::error!("Couldn't save original of {}: {}", url, e);
            return reject(ctx, &mut progress, None, RejectReason::DownloadFailed);
        }
    };
    progress.advance(PageState::Downloaded);

    // Parsing
    let parsers = Arc::clone(&ctx.parsers);
    let parsed = tokio::task::spawn_blocking(move || {
        let resource = Resource {
            url: &page.url,
            extension: &extension,
            content_type: page.content_type.as_deref(),
            bytes: &page.bytes,
        };
        parse_resource(parsers.as_ref(), &resource)
    })
    .await;

    let (text, links) = match parsed {
        Ok(ParseStage::Parsed { text, links }) => {
            progress.advance(PageState::ParserFound);
            (text, links)
        }
        Ok(ParseStage::NoParser) => {
            tracing::info!("Can't be parsed: {}", url);
            return reject(ctx, &mut progress, Some(staged), RejectReason::NoParser);
        }
        Ok(ParseStage::Failed(e)) => {
            progress.advance(PageState::ParserFound);
            tracing::warn!("Problem while parsing {}: {}", url, e);
            return reject(ctx, &mut progress, Some(staged), RejectReason::ParseFailed);
        }
        Err(e) => {
            progress.advance(PageState::ParserFound);
            tracing::error!("Parser task for {} failed: {}", url, e);
            return reject(ctx, &mut progress, Some(staged), RejectReason::ParseFailed);
        }
    };
    progress.advance(PageState::Parsed);

    // Language detection
    let filter = ctx.language.clone();
    let checked = tokio::task::spawn_blocking(move || {
        let accepted = filter.accepts(&text);
        (text, accepted)
    })
    .await;

    let text = match checked {
        Ok((text, true)) => text,
        Ok((_, false)) => {
            tracing::info!("Invalid language {}", url);
            return reject(ctx, &mut progress, Some(staged), RejectReason::LanguageMismatch);
        }
        Err(e) => {
            tracing::error!("Language detection for {} failed: {}", url, e);
            return reject(ctx, &mut progress, Some(staged), RejectReason::LanguageMismatch);
        }
    };
    progress.advance(PageState::LanguageAccepted);

    // Commit
    if let Err(e) = ctx.sink.stage_document(&mut staged, &text, &links).await {
        tracing::error!("Couldn't save parsed content of {}: {}", url, e);
        return reject(ctx, &mut progress, Some(staged), RejectReason::CommitFailed);
    }

    let committed = {
        let mut frontier = ctx.frontier.lock();
        commit_page(&mut frontier, &ctx.sink, staged, &pending, &links)
    };

    match committed {
        Ok(id) => {
            progress.advance(PageState::Accepted);
            tracing::info!("Accepted {} as {} ({} links)", url, id, links.len());
            Outcome::Accepted {
                url,
                id,
                links: links.len(),
            }
        }
        Err(e) => {
            progress.advance(PageState::Rejected(RejectReason::CommitFailed));
            tracing::error!("Couldn't commit {}: {}", url, e);
            Outcome::Rejected {
                url,
                reason: RejectReason::CommitFailed,
            }
        }
    }
}

/// Picks a parser and extracts text and links
fn parse_resource(registry: &dyn ParserRegistry, resource: &Resource<'_>) -> ParseStage {
    let Some(parser) = registry.parser_for(resource) else {
        return ParseStage::NoParser;
    };

    if !parser.can_be_parsed() {
        return ParseStage::NoParser;
    }

    match parser.content() {
        Ok(text) => ParseStage::Parsed {
            text,
            links: parser.links().into_iter().collect(),
        },
        Err(e) => ParseStage::Failed(e),
    }
}

/// Assigns the next ID, moves the staged files to it and queues the links
///
/// Must be called with the frontier lock held so that ID allocation and the
/// renames happen as one step. On a storage failure the URL is marked
/// rejected and no ID is consumed.
fn commit_page(
    frontier: &mut Frontier,
    sink: &PersistenceSink,
    staged: StagedPage,
    pending: &PendingUrl,
    links: &[Url],
) -> Result<u64, CommitError> {
    if frontier.is_visited(&pending.url) {
        sink.discard(staged);
        return Err(FrontierError::AlreadyTerminal(pending.url.to_string()).into());
    }

    let id = frontier.next_id();
    if let Err(e) = sink.commit(staged, id) {
        frontier.mark_rejected(&pending.url);
        return Err(e.into());
    }

    let assigned = frontier.mark_accepted(&pending.url)?;
    for link in links {
        frontier.push_from(pending, link);
    }

    Ok(assigned)
}

/// Marks the URL rejected, removing any staged files first
fn reject(
    ctx: &CrawlContext,
    progress: &mut Progress<'_>,
    staged: Option<StagedPage>,
    reason: RejectReason,
) -> Outcome {
    if let Some(staged) = staged {
        ctx.sink.discard(staged);
    }

    progress.advance(PageState::Rejected(reason));
    ctx.frontier.lock().mark_rejected(progress.url);
    tracing::info!("Rejected {}: {}", progress.url, reason);

    Outcome::Rejected {
        url: progress.url.clone(),
        reason,
    }
}
