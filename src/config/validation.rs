use crate::config::types::{
    Config, CrawlerConfig, FetchConfig, LanguageConfig, OutputConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Largest accepted worker pool
const MAX_WORKERS: u32 = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_language_config(&config.language)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // Budgets are unsigned, any value is a valid budget

    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    Ok(())
}

/// Validates fetch timeouts
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.connect_timeout < 1 {
        return Err(ConfigError::Validation(
            "connect-timeout must be at least 1 second".to_string(),
        ));
    }

    if config.read_timeout < 1 {
        return Err(ConfigError::Validation(
            "read-timeout must be at least 1 second".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact) = config.contact_url.as_deref().filter(|c| !c.is_empty()) {
        Url::parse(contact).map_err(|e| {
            ConfigError::Validation(format!("Invalid contact-url '{}': {}", contact, e))
        })?;
    }

    Ok(())
}

/// Validates the target language code
fn validate_language_config(config: &LanguageConfig) -> Result<(), ConfigError> {
    let code = &config.target;

    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_lowercase()) {
        return Err(ConfigError::Validation(format!(
            "language target must be a lowercase ISO 639-3 code (e.g. 'ces'), got '{}'",
            code
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.data_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "data-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}
