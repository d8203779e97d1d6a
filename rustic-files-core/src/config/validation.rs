use crate::config::schema::Config;
use crate::error::{Error, Result};

pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.name.trim().is_empty() {
        return Err(Error::Validation("server.name cannot be empty".to_owned()));
    }

    if config.server.protocol_version.trim().is_empty() {
        return Err(Error::Validation(
            "server.protocol_version cannot be empty".to_owned(),
        ));
    }

    if config.pool.max_workers == 0 {
        return Err(Error::Validation(
            "pool.max_workers must be at least 1".to_owned(),
        ));
    }

    let limits = &config.limits;
    let checks: [(&str, u64); 7] = [
        ("max_walk_entries", limits.max_walk_entries as u64),
        ("max_walk_depth", limits.max_walk_depth as u64),
        ("max_search_results", limits.max_search_results as u64),
        ("max_content_search_bytes", limits.max_content_search_bytes),
        ("content_match_lines", limits.content_match_lines as u64),
        ("max_batch_operations", limits.max_batch_operations as u64),
        ("max_hash_bytes", limits.max_hash_bytes),
    ];
    for (name, value) in checks {
        if value == 0 {
            return Err(Error::Validation(format!(
                "limits.{name} must be at least 1"
            )));
        }
    }

    Ok(())
}
