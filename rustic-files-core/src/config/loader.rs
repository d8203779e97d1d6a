use std::path::Path;

use crate::config::schema::Config;
use crate::config::validation::validate_config;
use crate::error::{Error, Result};

pub const ENV_MAX_WORKERS: &str = "RUSTIC_FILES_MAX_WORKERS";
pub const ENV_LOG_LEVEL: &str = "RUSTIC_FILES_LOG_LEVEL";
pub const ENV_MAX_SEARCH_RESULTS: &str = "RUSTIC_FILES_MAX_SEARCH_RESULTS";

pub fn load_from_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        Error::Config(format!("failed to read config '{}': {err}", path.display()))
    })?;

    toml::from_str(&content).map_err(|err| {
        Error::Config(format!(
            "failed to parse config '{}': {err}",
            path.display()
        ))
    })
}

/// Loads the config file when given (defaults otherwise), applies the
/// process environment on top and validates the result.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let base = match path {
        Some(path) => load_from_file(path)?,
        None => Config::default(),
    };
    let config = load_from_env(base, |key| std::env::var(key).ok())?;
    validate_config(&config)?;
    Ok(config)
}

pub fn load_from_env<F>(mut config: Config, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = non_empty(lookup(ENV_MAX_WORKERS)) {
        config.pool.max_workers = parse_usize(ENV_MAX_WORKERS, &raw)?;
    }

    if let Some(raw) = non_empty(lookup(ENV_MAX_SEARCH_RESULTS)) {
        config.limits.max_search_results = parse_usize(ENV_MAX_SEARCH_RESULTS, &raw)?;
    }

    if let Some(raw) = non_empty(lookup(ENV_LOG_LEVEL)) {
        config.logging.level = raw;
    }

    Ok(config)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|raw| !raw.is_empty())
}

fn parse_usize(key: &str, raw: &str) -> Result<usize> {
    raw.parse::<usize>().map_err(|err| {
        Error::Config(format!(
            "environment variable {key} must be a non-negative integer, got '{raw}': {err}"
        ))
    })
}
