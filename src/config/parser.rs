use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::{Path, PathBuf};

/// Loads and parses a configuration file from the given path
///
/// Every section is optional; missing keys fall back to their defaults.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use kgs_crawl::config::load_config;
///
/// let config = load_config(Path::new("crawl.toml")).unwrap();
/// println!("Max depth: {}", config.crawler.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

impl Config {
    /// Builds a validated configuration for a programmatic crawl
    ///
    /// Everything besides the budgets and the output directory keeps its
    /// default value.
    pub fn new(
        max_hops: u32,
        max_depth: u32,
        data_dir: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.crawler.max_hops = max_hops;
        config.crawler.max_depth = max_depth;
        config.output.data_dir = data_dir.into();
        validate(&config)?;
        Ok(config)
    }
}
