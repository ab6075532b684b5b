//! Read-only reporting endpoints.

pub mod gateway;
pub mod queries;

pub use gateway::{CacheStatus, GatewayError, Report, ReportingGateway, X_CACHE};
pub use queries::ReportKind;
