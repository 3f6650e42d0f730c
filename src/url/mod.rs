//! URL handling module
//!
//! This module provides URL normalization and the coarse host grouping used
//! to decide whether following a link crosses a site boundary.

mod host_group;
mod normalize;

// Re-export main functions
pub use host_group::{host_group, same_host_group};
pub use normalize::{normalize, normalize_url};
