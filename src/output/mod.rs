//! Output module for crawl reports
//!
//! This module handles:
//! - Counting accepted and rejected pages while the crawl runs
//! - Printing the final report

pub mod stats;

pub use stats::{print_report, CrawlReport};
