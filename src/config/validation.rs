use crate::config::types::{Config, CrawlerConfig, OutputConfig, SourceConfig};
use crate::url::normalize_url;
use crate::{ConfigError, ConfigResult};
use std::collections::HashSet;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    validate_sources(&config.sources)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    validate_delay("delay", config.delay)?;

    if config.retry_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "retry-attempts must be >= 1, got {}",
            config.retry_attempts
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout must be >= 1s, got {}s",
            config.request_timeout
        )));
    }

    if config.checkpoint_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "checkpoint-interval must be >= 1, got {}",
            config.checkpoint_interval
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.checkpoint_dir.is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the source list
fn validate_sources(sources: &[SourceConfig]) -> Result<(), ConfigError> {
    if sources.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[source]] must be configured".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for source in sources {
        validate_source_name(&source.name)?;

        if !names.insert(source.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source name '{}'",
                source.name
            )));
        }

        if source.seeds.is_empty() && source.category.is_none() {
            return Err(ConfigError::Validation(format!(
                "source '{}' has neither seeds nor a category",
                source.name
            )));
        }

        if let Some(category) = &source.category {
            if category.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "category of source '{}' is empty",
                    source.name
                )));
            }
        }

        if let Some(api_url) = &source.api_url {
            normalize_url(api_url).map_err(|e| {
                ConfigError::InvalidUrl(format!(
                    "Invalid api-url '{}' in source '{}': {}",
                    api_url, source.name, e
                ))
            })?;
        }

        for seed in &source.seeds {
            normalize_url(seed).map_err(|e| {
                ConfigError::InvalidUrl(format!(
                    "Invalid seed '{}' in source '{}': {}",
                    seed, source.name, e
                ))
            })?;
        }

        if let Some(delay) = source.delay {
            validate_delay(&format!("delay of source '{}'", source.name), delay)?;
        }
    }

    Ok(())
}

/// Source names become part of checkpoint file names
fn validate_source_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Validation(
            "source name cannot be empty".to_string(),
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "source name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            name
        )));
    }

    Ok(())
}

fn validate_delay(what: &str, delay: f64) -> Result<(), ConfigError> {
    if !delay.is_finite() || delay < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be a non-negative number of seconds, got {}",
            what, delay
        )));
    }
    Ok(())
}
