//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, deserialize, env secrets)
//!     → validation.rs (semantic checks)
//!     → ShimConfig (validated, immutable)
//!     → injected into HttpServer at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AnalyticsConfig, Destination, ListenerConfig, LogFormat, ObservabilityConfig,
    ReportingConfig, RoutingConfig, ShimConfig, TelemetryConfig,
};
