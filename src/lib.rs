//! PHP probe logging shim.
//!
//! Flags requests for `.php` paths, records them in the background, serves
//! cached reporting queries and forwards everything else by Host.

pub mod analytics;
pub mod cache;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod reporting;
pub mod routing;
pub mod telemetry;

pub use config::schema::ShimConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
