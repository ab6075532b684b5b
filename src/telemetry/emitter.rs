//! Fire-and-forget submission of access events.

use std::sync::Arc;

use axum::http::HeaderMap;

use crate::config::ShimConfig;
use crate::lifecycle::BackgroundTasks;
use crate::observability::metrics;
use crate::telemetry::event::AccessEvent;
use crate::telemetry::sink::{EventSink, HttpEventSink, LogSink};

/// Builds access events and hands them to the sink off the response path.
#[derive(Clone)]
pub struct TelemetryEmitter {
    sink: Arc<dyn EventSink>,
    tasks: BackgroundTasks,
}

impl TelemetryEmitter {
    pub fn new(sink: Arc<dyn EventSink>, tasks: BackgroundTasks) -> Self {
        Self { sink, tasks }
    }

    /// Pick the sink from configuration: HTTP ingestion if a URL is set, the log otherwise.
    pub fn from_config(config: &ShimConfig, tasks: BackgroundTasks) -> Self {
        let sink: Arc<dyn EventSink> = if config.telemetry.ingest_url.is_empty() {
            tracing::warn!("telemetry.ingest_url not set, PHP probes go to the log only");
            Arc::new(LogSink)
        } else {
            Arc::new(HttpEventSink::new(
                config.telemetry.ingest_url.clone(),
                config.analytics.api_token.clone(),
                config.analytics.dataset.clone(),
            ))
        };
        Self::new(sink, tasks)
    }

    /// Record a flagged request. Returns immediately; the write settles in the background.
    pub fn emit(&self, path: &str, headers: &HeaderMap, request_id: &str) {
        let event = AccessEvent::from_request(path, headers);
        metrics::record_probe(&event.country);

        let sink = self.sink.clone();
        let request_id = request_id.to_string();
        self.tasks.spawn(async move {
            let event_id = event.event_id;
            if let Err(e) = sink.write(event.to_data_point()).await {
                metrics::record_telemetry_failure();
                tracing::warn!(
                    request_id = %request_id,
                    event_id = %event_id,
                    error = %e,
                    "Failed to record PHP probe"
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::event::DataPoint;
    use crate::telemetry::sink::SinkError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        points: Mutex<Vec<DataPoint>>,
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn write(&self, point: DataPoint) -> Result<(), SinkError> {
            self.points.lock().unwrap().push(point);
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl EventSink for FailingSink {
        async fn write(&self, _point: DataPoint) -> Result<(), SinkError> {
            Err(SinkError::Rejected {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_emit_submits_once() {
        let sink = Arc::new(RecordingSink::default());
        let tasks = BackgroundTasks::new();
        let emitter = TelemetryEmitter::new(sink.clone(), tasks.clone());

        emitter.emit("/xmlrpc.php", &HeaderMap::new(), "req-1");
        tasks.drain().await;

        let points = sink.points.lock().unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].blobs[0], "/xmlrpc.php");
    }

    #[tokio::test]
    async fn test_failing_sink_is_swallowed() {
        let tasks = BackgroundTasks::new();
        let emitter = TelemetryEmitter::new(Arc::new(FailingSink), tasks.clone());

        emitter.emit("/a.php", &HeaderMap::new(), "req-2");
        tasks.drain().await;
        assert_eq!(tasks.pending(), 0);
    }

    #[test]
    fn test_from_config_without_url_uses_log_sink() {
        // Construction must not touch the network or the runtime
        let emitter = TelemetryEmitter::from_config(&ShimConfig::default(), BackgroundTasks::new());
        assert_eq!(emitter.tasks.pending(), 0);
    }
}
