//! Cached query gateway for the reporting endpoints.
//!
//! # Flow
//! ```text
//! path → ReportKind (404 if unknown)
//!      → bearer check (401 if configured and wrong)
//!      → cache hit?  → 200 x-cache: HIT
//!      → SQL query   → cache put → 200 x-cache: MISS
//!                    → upstream failure → 500, nothing cached
//! ```
//!
//! Concurrent misses for one key are not coalesced.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use thiserror::Error;

use crate::analytics::{AnalyticsClient, AnalyticsError};
use crate::cache::KvStore;
use crate::config::ShimConfig;
use crate::http::request::bearer_token;
use crate::observability::metrics;
use crate::reporting::queries::ReportKind;

pub const X_CACHE: &str = "x-cache";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found")]
    NotFound,

    #[error(transparent)]
    Upstream(#[from] AnalyticsError),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// Successful reporting payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub payload: Value,
    pub cache: CacheStatus,
}

impl IntoResponse for Report {
    fn into_response(self) -> Response {
        let mut response = axum::Json(self.payload).into_response();
        response
            .headers_mut()
            .insert(X_CACHE, HeaderValue::from_static(self.cache.as_str()));
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }
}

pub struct ReportingGateway {
    analytics: AnalyticsClient,
    cache: Arc<dyn KvStore>,
    prefix: String,
    dataset: String,
    expected_token: Option<String>,
    ttl: Duration,
}

impl ReportingGateway {
    pub fn new(config: &ShimConfig, analytics: AnalyticsClient, cache: Arc<dyn KvStore>) -> Self {
        Self {
            analytics,
            cache,
            prefix: config.reporting.prefix.clone(),
            dataset: config.analytics.dataset.clone(),
            expected_token: config.reporting.token.clone(),
            ttl: Duration::from_secs(config.reporting.cache_ttl_secs),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Handle a reporting request, mapping failures to plain-text error responses.
    pub async fn handle(&self, path: &str, headers: &HeaderMap, request_id: &str) -> Response {
        match self.report(path, headers).await {
            Ok(report) => {
                tracing::debug!(
                    request_id = %request_id,
                    path = %path,
                    cache = report.cache.as_str(),
                    "Reporting request served"
                );
                report.into_response()
            }
            Err(e) => {
                match &e {
                    GatewayError::Upstream(err) => {
                        tracing::error!(request_id = %request_id, path = %path, error = %err, "Reporting query failed")
                    }
                    _ => tracing::info!(request_id = %request_id, path = %path, error = %e, "Reporting request refused"),
                }
                e.into_response()
            }
        }
    }

    /// Resolve, authorize and serve a reporting path.
    pub async fn report(&self, path: &str, headers: &HeaderMap) -> Result<Report, GatewayError> {
        let kind = ReportKind::from_path(path, &self.prefix).ok_or(GatewayError::NotFound)?;
        self.authorize(headers)?;

        let key = path.to_ascii_lowercase();
        match self.cache.get(&key).await {
            Ok(Some(payload)) => {
                metrics::record_report_cache(kind.name(), CacheStatus::Hit.as_str());
                return Ok(Report {
                    payload,
                    cache: CacheStatus::Hit,
                });
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(report = kind.name(), key = %key, error = %e, "Cache read failed, querying upstream"),
        }

        metrics::record_report_cache(kind.name(), CacheStatus::Miss.as_str());
        let payload = self.analytics.query_data(&kind.sql(&self.dataset)).await?;

        if let Err(e) = self.cache.put(&key, payload.clone(), self.ttl).await {
            tracing::warn!(report = kind.name(), key = %key, error = %e, "Cache write failed");
        }

        Ok(Report {
            payload,
            cache: CacheStatus::Miss,
        })
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), GatewayError> {
        match self.expected_token.as_deref() {
            Some("") => Ok(()),
            Some(expected) if bearer_token(headers) == Some(expected) => Ok(()),
            _ => Err(GatewayError::Unauthorized),
        }
    }
}
