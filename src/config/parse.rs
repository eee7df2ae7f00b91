use super::types::*;
use crate::config::{expand_env_vars, expand_tilde, ENV_VAR_PATTERN};
use crate::feed::fetcher::MAX_PAGE_SIZE;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml_string = fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config(&yaml_string).map_err(|e| match e {
        ConfigError::YamlParse(e) => ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("in file '{}': {}", path.display(), e),
        )),
        other => other,
    })
}

/// Parse and validate a config document.
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    let yaml = expand_env_vars(yaml);
    check_unexpanded_vars(&yaml)?;

    let mut config: Config = serde_yaml::from_str(&yaml)?;
    expand_paths(&mut config);
    validate_config(&config)?;

    Ok(config)
}

fn check_unexpanded_vars(yaml: &str) -> Result<(), ConfigError> {
    let mut unexpanded: Vec<&str> = ENV_VAR_PATTERN
        .captures_iter(yaml)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();

    if unexpanded.is_empty() {
        return Ok(());
    }

    unexpanded.sort();
    unexpanded.dedup();

    Err(ConfigError::Validation(format!(
        "environment variables are not set: {}\n\
         Set them, or replace the $env{{...}} references in the config file",
        unexpanded.join(", ")
    )))
}

fn expand_paths(config: &mut Config) {
    if let OutputConfig::File { path } = &mut config.output {
        *path = expand_tilde(path);
    }
    if let Some(state) = &mut config.state {
        state.cursor_path = expand_tilde(&state.cursor_path);
    }
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    validate_wiki(&config.wiki, &mut errors);
    validate_feed(&config.feed, &mut errors);

    if let OutputConfig::File { path } = &config.output {
        if path.as_os_str().is_empty() {
            errors.push("output.path cannot be empty".to_string());
        }
    }
    if let Some(state) = &config.state {
        if state.cursor_path.as_os_str().is_empty() {
            errors.push("state.cursor_path cannot be empty".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

fn validate_wiki(wiki: &WikiConfig, errors: &mut Vec<String>) {
    for (field, url) in [("wiki.api_url", &wiki.api_url), ("wiki.base_url", &wiki.base_url)] {
        if !matches!(url.scheme(), "http" | "https") {
            errors.push(format!("{}: unsupported scheme '{}'", field, url.scheme()));
        }
    }

    if !wiki.base_url.path().ends_with('/') {
        errors.push(format!(
            "wiki.base_url must end with '/' (got '{}')",
            wiki.base_url
        ));
    }
    if wiki.base_url.query().is_some() {
        errors.push("wiki.base_url cannot contain a query string".to_string());
    }

    if wiki.user_agent.trim().is_empty() {
        errors.push("wiki.user_agent cannot be empty".to_string());
    }
    if wiki.timeout.is_zero() {
        errors.push("wiki.timeout must be greater than zero".to_string());
    }
}

fn validate_feed(feed: &FeedConfig, errors: &mut Vec<String>) {
    if feed.poll_interval.is_zero() {
        errors.push("feed.poll_interval must be greater than zero".to_string());
    }
    if feed.page_size == 0 || feed.page_size > MAX_PAGE_SIZE {
        errors.push(format!(
            "feed.page_size must be between 1 and {} (got {})",
            MAX_PAGE_SIZE, feed.page_size
        ));
    }
}
