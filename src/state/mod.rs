//! State module for tracking a URL through the crawl pipeline
//!
//! # Components
//!
//! - `PageState`: The stage a popped URL has reached (redirect check, download, parse, ...)
//! - `RejectReason`: Why a URL ended without receiving an ID
//! - `Outcome`: The terminal result of processing one URL

mod page_state;

// Re-export main types
pub use page_state::{Outcome, PageState, RejectReason};
