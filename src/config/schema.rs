//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the shim.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for the shim.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ShimConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub security: SecurityConfig,

    /// Analytics account and SQL API settings.
    pub analytics: AnalyticsConfig,

    /// PHP probe telemetry settings.
    pub telemetry: TelemetryConfig,

    /// Reporting endpoint settings.
    pub reporting: ReportingConfig,

    /// Host-to-destination routing table.
    pub routing: RoutingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// How long shutdown waits for detached telemetry writes, in seconds.
    pub drain_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            drain_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Analytics account configuration, shared by the SQL client and the HTTP event sink.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Account identifier used in the SQL endpoint path.
    pub account_id: String,

    /// Bearer token for the analytics API.
    pub api_token: String,

    /// Base URL of the analytics API.
    pub api_base_url: String,

    /// Event table (dataset) the probes are written to and queried from.
    pub dataset: String,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            api_token: String::new(),
            api_base_url: "https://api.cloudflare.com/client/v4".to_string(),
            dataset: "php_access".to_string(),
        }
    }
}

impl AnalyticsConfig {
    /// Full URL of the SQL query endpoint.
    pub fn sql_endpoint(&self) -> String {
        format!(
            "{}/accounts/{}/analytics_engine/sql",
            self.api_base_url.trim_end_matches('/'),
            self.account_id
        )
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Record PHP probe events.
    pub enabled: bool,

    /// Ingestion URL for the append-only sink. Empty = log the events instead.
    pub ingest_url: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ingest_url: String::new(),
        }
    }
}

/// Reporting endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportingConfig {
    /// Path namespace of the reporting endpoints.
    pub prefix: String,

    /// Expected bearer token. `None` refuses every request, `Some("")` disables the check.
    pub token: Option<String>,

    /// Cache TTL for query results in seconds (floored at 60).
    pub cache_ttl_secs: u64,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            prefix: "/__phplog".to_string(),
            token: None,
            cache_ttl_secs: 60,
        }
    }
}

/// Where a non-reporting request is forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// The configured internal service.
    Internal,
    /// The plain upstream origin.
    Origin,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Authority of the default upstream (e.g., "127.0.0.1:3000").
    pub origin: String,

    /// Authority of the internal service, required when any host maps to it.
    pub internal_service: Option<String>,

    /// Exact host matches. Unlisted hosts go to the origin.
    pub hosts: HashMap<String, Destination>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            origin: "127.0.0.1:3000".to_string(),
            internal_service: None,
            hosts: HashMap::new(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
