//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::ShimConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_ACCOUNT_ID: &str = "PROBE_SHIM_ACCOUNT_ID";
pub const ENV_ANALYTICS_TOKEN: &str = "PROBE_SHIM_ANALYTICS_TOKEN";
pub const ENV_REPORTING_TOKEN: &str = "PROBE_SHIM_REPORTING_TOKEN";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
///
/// Secrets may be supplied through the environment instead of the file;
/// environment values win.
pub fn load_config(path: &Path) -> Result<ShimConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config = parse_config(&content)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML document without validating it.
pub fn parse_config(content: &str) -> Result<ShimConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Overlay secrets looked up through `lookup` onto the parsed file.
pub fn apply_env_overrides<F>(config: &mut ShimConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(account_id) = lookup(ENV_ACCOUNT_ID) {
        config.analytics.account_id = account_id;
    }
    if let Some(token) = lookup(ENV_ANALYTICS_TOKEN) {
        config.analytics.api_token = token;
    }
    if let Some(token) = lookup(ENV_REPORTING_TOKEN) {
        config.reporting.token = Some(token);
    }
}
