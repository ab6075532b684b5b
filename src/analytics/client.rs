//! Analytics SQL API client.
//!
//! # Responsibilities
//! - POST raw SQL to the account's query endpoint with a bearer token
//! - Surface non-success statuses with the upstream body
//! - Return either the plain `data` field or the normalized `{count, items}`

use serde_json::{Map, Value};
use thiserror::Error;

use crate::analytics::normalize::{normalize_bytes, QueryResult};
use crate::config::AnalyticsConfig;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Upstream answered with a non-success status.
    #[error("analytics query failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection or protocol failure before a status was received.
    #[error("analytics transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

#[derive(Clone)]
pub struct AnalyticsClient {
    http: reqwest::Client,
    endpoint: String,
    api_token: String,
}

impl AnalyticsClient {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(http: reqwest::Client, config: &AnalyticsConfig) -> Self {
        Self {
            http,
            endpoint: config.sql_endpoint(),
            api_token: config.api_token.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn execute(&self, sql: &str) -> AnalyticsResult<Vec<u8>> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .body(sql.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // A failed body read must not mask the status
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Analytics query rejected");
            return Err(AnalyticsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Run a canned query and return the `data` field as-is.
    ///
    /// A missing field or unparseable body yields an empty array.
    pub async fn query_data(&self, sql: &str) -> AnalyticsResult<Value> {
        let body = self.execute(sql).await?;
        let parsed: Value =
            serde_json::from_slice(&body).unwrap_or_else(|_| Value::Object(Map::new()));
        Ok(parsed
            .get("data")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new())))
    }

    /// Run an arbitrary query and normalize whatever shape comes back.
    pub async fn query(&self, sql: &str) -> AnalyticsResult<QueryResult> {
        let body = self.execute(sql).await?;
        Ok(normalize_bytes(&body))
    }
}

impl std::fmt::Debug for AnalyticsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
