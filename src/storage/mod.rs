//! Storage module for persisting crawl artifacts
//!
//! This module owns the on-disk contract with downstream text-mining jobs:
//!
//! ```text
//! original/<id>.<ext>   raw bytes as fetched
//! parsed/<id>.txt       extracted text, UTF-8
//! links/<id>.txt        one absolute URL per line
//! ids.txt               "<url> <id>" per accepted page, sorted by id
//! ```
//!
//! Pages are first written under staging names and only renamed to their
//! numeric ID once the ID is allocated, so a rejected or failed page never
//! leaves numbered files behind.

mod index;
mod sink;

pub use index::UrlIndex;
pub use sink::{PersistenceSink, StagedPage};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing crawl artifacts
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Corrupt ID index at line {line}: '{content}'")]
    Corrupt { line: usize, content: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
