//! Append-only event sinks.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::telemetry::event::DataPoint;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("sink rejected event with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Destination for access events. Writes are submitted once, never retried.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn write(&self, point: DataPoint) -> Result<(), SinkError>;
}

#[derive(Serialize)]
struct IngestRecord<'a> {
    dataset: &'a str,
    #[serde(flatten)]
    point: &'a DataPoint,
}

/// Posts events as JSON to an HTTP ingestion endpoint.
pub struct HttpEventSink {
    client: reqwest::Client,
    url: String,
    api_token: String,
    dataset: String,
}

impl HttpEventSink {
    pub fn new(url: impl Into<String>, api_token: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            api_token: api_token.into(),
            dataset: dataset.into(),
        }
    }
}

#[async_trait]
impl EventSink for HttpEventSink {
    async fn write(&self, point: DataPoint) -> Result<(), SinkError> {
        let record = IngestRecord {
            dataset: &self.dataset,
            point: &point,
        };
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_token)
            .json(&record)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Writes events to the structured log. Used when no ingestion URL is configured.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl EventSink for LogSink {
    async fn write(&self, point: DataPoint) -> Result<(), SinkError> {
        tracing::info!(
            blobs = ?point.blobs,
            doubles = ?point.doubles,
            index = point.indexes.first().map(String::as_str).unwrap_or_default(),
            "PHP probe event"
        );
        Ok(())
    }
}
