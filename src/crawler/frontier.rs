//! Crawl frontier: pending work, visited set and ID allocation
//!
//! This module handles:
//! - Priority queue of URLs waiting to be processed (shallow first, fewer hops first)
//! - Depth and hop budget enforcement
//! - Deduplication by canonical URL
//! - Claiming popped URLs so concurrent workers never process the same page
//! - Dense ID assignment for accepted pages

use crate::storage::UrlIndex;
use crate::url::{normalize_url, same_host_group};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use thiserror::Error;
use url::Url;

/// A URL waiting to be processed, with its distance from the seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUrl {
    /// The URL as discovered; this is what gets fetched
    pub url: Url,

    /// Link steps from the seed
    pub depth: u32,

    /// Site-boundary crossings from the seed
    pub hops: u32,
}

impl PendingUrl {
    pub fn new(url: Url, depth: u32, hops: u32) -> Self {
        Self { url, depth, hops }
    }
}

/// Queue entry carrying the canonical key and insertion order
#[derive(Debug)]
struct QueueEntry {
    pending: PendingUrl,
    key: String,
    seq: u64,
}

// Lower (depth, hops) pops first; equal priorities pop in insertion order
impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse comparison so BinaryHeap behaves as a min-heap
        other
            .pending
            .depth
            .cmp(&self.pending.depth)
            .then_with(|| other.pending.hops.cmp(&self.pending.hops))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for QueueEntry {}

/// Result of offering a URL to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The URL was queued
    Queued,

    /// The URL is already visited or being processed
    AlreadySeen,

    /// The URL lies beyond the depth or hop budget
    BudgetExceeded,
}

/// Errors raised by frontier bookkeeping
#[derive(Debug, Error)]
pub enum FrontierError {
    #[error("URL already reached a terminal state: {0}")]
    AlreadyTerminal(String),
}

/// The crawl frontier for one crawl run
///
/// `visited` is the single source of truth for whether a URL must be skipped.
/// The queue may hold stale duplicates; they are discarded lazily when they
/// reach the head.
#[derive(Debug)]
pub struct Frontier {
    queue: BinaryHeap<QueueEntry>,
    visited: HashSet<String>,
    in_flight: HashSet<String>,
    index: UrlIndex,
    max_depth: u32,
    max_hops: u32,
    next_seq: u64,
}

impl Frontier {
    /// Creates an empty frontier with fixed budgets
    ///
    /// # Arguments
    ///
    /// * `max_depth` - Largest allowed link distance from the seed (0 = seed only)
    /// * `max_hops` - Largest allowed number of site-boundary crossings
    pub fn new(max_depth: u32, max_hops: u32) -> Self {
        Self {
            queue: BinaryHeap::new(),
            visited: HashSet::new(),
            in_flight: HashSet::new(),
            index: UrlIndex::new(),
            max_depth,
            max_hops,
            next_seq: 0,
        }
    }

    /// Offers a URL at an explicit depth and hop count
    ///
    /// Visited and in-flight URLs are ignored. URLs outside the budget are
    /// logged and dropped; this is not an error.
    pub fn push(&mut self, url: &Url, depth: u32, hops: u32) -> PushOutcome {
        let key = normalize_url(url);

        if self.visited.contains(&key) || self.in_flight.contains(&key) {
            tracing::trace!("Skipping already seen URL {}", url);
            return PushOutcome::AlreadySeen;
        }

        if depth > self.max_depth || hops > self.max_hops {
            tracing::info!(
                "Rejected {} at depth {} hops {} (limits: depth {}, hops {})",
                url,
                depth,
                hops,
                self.max_depth,
                self.max_hops
            );
            return PushOutcome::BudgetExceeded;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(QueueEntry {
            pending: PendingUrl::new(url.clone(), depth, hops),
            key,
            seq,
        });

        PushOutcome::Queued
    }

    /// Offers a link discovered on `parent`
    ///
    /// The child is one step deeper than its parent and costs one hop when it
    /// leaves the parent's host group.
    pub fn push_from(&mut self, parent: &PendingUrl, url: &Url) -> PushOutcome {
        let hop = if same_host_group(&parent.url, url) { 0 } else { 1 };
        self.push(
            url,
            parent.depth.saturating_add(1),
            parent.hops.saturating_add(hop),
        )
    }

    /// Takes the next eligible URL and claims it
    ///
    /// Entries already visited or claimed by another worker are discarded.
    /// The returned URL stays claimed until [`mark_accepted`](Self::mark_accepted)
    /// or [`mark_rejected`](Self::mark_rejected) is called for it.
    pub fn pop(&mut self) -> Option<PendingUrl> {
        while let Some(entry) = self.queue.pop() {
            if self.is_stale(&entry.key) {
                tracing::debug!("Discarding stale queue entry {}", entry.pending.url);
                continue;
            }

            self.in_flight.insert(entry.key);
            return Some(entry.pending);
        }

        None
    }

    /// Marks a URL accepted and assigns its permanent ID
    ///
    /// # Returns
    ///
    /// * `Ok(id)` - The newly assigned ID
    /// * `Err(FrontierError::AlreadyTerminal)` - The URL was already accepted or rejected
    pub fn mark_accepted(&mut self, url: &Url) -> Result<u64, FrontierError> {
        let key = normalize_url(url);

        if self.visited.contains(&key) {
            return Err(FrontierError::AlreadyTerminal(key));
        }

        self.in_flight.remove(&key);
        self.visited.insert(key.clone());
        Ok(self.index.assign(key))
    }

    /// Marks a URL rejected; no ID is consumed
    pub fn mark_rejected(&mut self, url: &Url) {
        let key = normalize_url(url);
        self.in_flight.remove(&key);
        if !self.visited.insert(key) {
            tracing::debug!("{} was already visited", url);
        }
    }

    /// Returns true when no eligible entry remains in the queue
    ///
    /// Stale heads are discarded on the way. URLs currently claimed by
    /// workers do not count as pending.
    pub fn is_empty(&mut self) -> bool {
        while let Some(head) = self.queue.peek() {
            if !self.is_stale(&head.key) {
                return false;
            }
            self.queue.pop();
        }
        true
    }

    /// Returns true if the canonical URL was already visited
    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(&normalize_url(url))
    }

    /// The ID the next accepted page will receive
    pub fn next_id(&self) -> u64 {
        self.index.next_id()
    }

    /// Number of queue entries, including stale ones
    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Number of URLs currently claimed by workers
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn accepted_len(&self) -> usize {
        self.index.len()
    }

    /// The ID table of accepted pages
    pub fn index(&self) -> &UrlIndex {
        &self.index
    }

    fn is_stale(&self, key: &str) -> bool {
        self.visited.contains(key) || self.in_flight.contains(key)
    }
}
