//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional, so an empty file yields a usable configuration.
//!
//! # Example
//!
//! ```no_run
//! use kgs_crawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FetchConfig, LanguageConfig, OutputConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};

// Re-export validation
pub use validation::validate;
