//! Configuration validation.
//!
//! Semantic checks only; serde handles syntax. All errors are collected
//! rather than stopping at the first one.

use std::net::SocketAddr;
use std::str::FromStr;

use axum::http::uri::Authority;
use thiserror::Error;
use url::Url;

use crate::config::schema::{Destination, ShimConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid socket address for {field}: '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("invalid URL for {field}: '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("invalid authority for {field}: '{value}'")]
    InvalidAuthority { field: &'static str, value: String },

    #[error("reporting.prefix must be non-empty and start with '/'")]
    InvalidPrefix,

    #[error("reporting.token must be set (use an empty string to disable auth)")]
    MissingReportingToken,

    #[error("host '{0}' routes to internal but routing.internal_service is not set")]
    MissingInternalService(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,
}

/// Validate a parsed configuration, returning every problem found.
pub fn validate_config(config: &ShimConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_socket_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_socket_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    check_url(&mut errors, "analytics.api_base_url", &config.analytics.api_base_url);
    if !config.telemetry.ingest_url.is_empty() {
        check_url(&mut errors, "telemetry.ingest_url", &config.telemetry.ingest_url);
    }

    if !config.reporting.prefix.starts_with('/') {
        errors.push(ValidationError::InvalidPrefix);
    }
    if config.reporting.token.is_none() {
        errors.push(ValidationError::MissingReportingToken);
    }

    check_authority(&mut errors, "routing.origin", &config.routing.origin);
    match &config.routing.internal_service {
        Some(internal) => check_authority(&mut errors, "routing.internal_service", internal),
        None => {
            let mut internal_hosts: Vec<&String> = config
                .routing
                .hosts
                .iter()
                .filter(|(_, dest)| **dest == Destination::Internal)
                .map(|(host, _)| host)
                .collect();
            internal_hosts.sort();
            for host in internal_hosts {
                errors.push(ValidationError::MissingInternalService(host.clone()));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_socket_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if Url::parse(value).is_err() {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}

fn check_authority(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.is_empty() || Authority::from_str(value).is_err() {
        errors.push(ValidationError::InvalidAuthority {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ShimConfig {
        let mut config = ShimConfig::default();
        config.reporting.token = Some("t".to_string());
        config
    }

    #[test]
    fn test_defaults_need_reporting_token() {
        let errors = validate_config(&ShimConfig::default()).unwrap_err();
        assert_eq!(errors, vec![ValidationError::MissingReportingToken]);
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid_config();
        config.listener.bind_address = "not-an-addr".to_string();
        config.reporting.prefix = "phplog".to_string();
        config.analytics.api_base_url = "::nope".to_string();
        config
            .routing
            .hosts
            .insert("api.example.com".to_string(), Destination::Internal);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::InvalidPrefix));
        assert!(errors.contains(&ValidationError::MissingInternalService(
            "api.example.com".to_string()
        )));
    }

    #[test]
    fn test_empty_token_is_accepted() {
        let mut config = valid_config();
        config.reporting.token = Some(String::new());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_bad_ingest_url() {
        let mut config = valid_config();
        config.telemetry.ingest_url = "not a url".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors[0],
            ValidationError::InvalidUrl { field: "telemetry.ingest_url", .. }
        ));
    }
}
