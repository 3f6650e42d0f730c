//! Statistics collected while a crawl runs
//!
//! The coordinator records every terminal outcome here; the CLI prints the
//! final report.

use crate::state::{Outcome, RejectReason};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Summary of one crawl run
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Pages that received an ID
    pub accepted: u64,

    /// Count of rejected pages by reason
    pub rejected: BTreeMap<RejectReason, u64>,

    /// Total number of outbound links written for accepted pages
    pub links_written: u64,

    /// True if the crawl stopped before the frontier was exhausted
    pub cancelled: bool,

    /// Wall-clock duration of the crawl
    pub elapsed: Duration,

    /// Directory the artifacts were written to
    pub data_dir: PathBuf,
}

impl CrawlReport {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Adds one terminal outcome to the counters
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Accepted { links, .. } => {
                self.accepted += 1;
                self.links_written += *links as u64;
            }
            Outcome::Rejected { reason, .. } => {
                *self.rejected.entry(*reason).or_insert(0) += 1;
            }
        }
    }

    /// Total number of rejected pages
    pub fn rejected_total(&self) -> u64 {
        self.rejected.values().sum()
    }

    /// Rejections for a single reason
    pub fn rejected_for(&self, reason: RejectReason) -> u64 {
        self.rejected.get(&reason).copied().unwrap_or(0)
    }

    /// Number of URLs that reached a terminal state
    pub fn visited(&self) -> u64 {
        self.accepted + self.rejected_total()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

/// Prints the report to stdout in a formatted manner
///
/// # Arguments
///
/// * `report` - The report to display
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Overview:");
    println!("  Data directory: {}", report.data_dir.display());
    println!("  URLs visited: {}", report.visited());
    println!("  Pages accepted: {}", report.accepted);
    println!("  Links written: {}", report.links_written);
    println!("  Elapsed: {:.1}s", report.elapsed.as_secs_f64());
    if report.cancelled {
        println!("  Status: cancelled");
    }
    println!();

    if !report.rejected.is_empty() {
        println!("Rejections:");
        // Sort reasons by count (descending)
        let mut counts: Vec<_> = report.rejected.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));

        for (reason, count) in counts {
            println!("  {}: {}", reason, count);
        }
        println!();
    }

    let visited = report.visited();
    let acceptance_rate = if visited > 0 {
        (report.accepted as f64 / visited as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Acceptance Rate: {:.1}% ({} / {} URLs accepted)",
        acceptance_rate, report.accepted, visited
    );
}
