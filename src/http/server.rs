//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all handler
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Flag PHP probes and hand them to telemetry
//! - Serve reporting endpoints through the cached gateway
//! - Forward everything else to the internal service or the origin
//! - Drain background telemetry on shutdown

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use axum::http::uri::InvalidUri;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::analytics::AnalyticsClient;
use crate::cache::{KvStore, MemoryKvStore};
use crate::config::ShimConfig;
use crate::http::forward::{forward, UpstreamClient};
use crate::http::request::request_id;
use crate::lifecycle::{shutdown::wait_for, BackgroundTasks};
use crate::observability::metrics;
use crate::reporting::ReportingGateway;
use crate::routing::{is_php_path, is_reporting_path, HostRouter};
use crate::telemetry::{EventSink, TelemetryEmitter};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid routing authority: {0}")]
    Routing(#[from] InvalidUri),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<HostRouter>,
    pub client: UpstreamClient,
    pub telemetry: Option<TelemetryEmitter>,
    pub gateway: Arc<ReportingGateway>,
}

/// HTTP server for the shim.
pub struct HttpServer {
    router: Router,
    config: ShimConfig,
    tasks: BackgroundTasks,
}

impl HttpServer {
    /// Create a server with the sink and cache chosen by configuration.
    pub fn new(config: ShimConfig) -> Result<Self, ServerError> {
        let tasks = BackgroundTasks::new();
        let telemetry = TelemetryEmitter::from_config(&config, tasks.clone());
        Self::build(config, telemetry, Arc::new(MemoryKvStore::new()), tasks)
    }

    /// Create a server around an explicit event sink and cache store.
    pub fn with_components(
        config: ShimConfig,
        sink: Arc<dyn EventSink>,
        cache: Arc<dyn KvStore>,
    ) -> Result<Self, ServerError> {
        let tasks = BackgroundTasks::new();
        let telemetry = TelemetryEmitter::new(sink, tasks.clone());
        Self::build(config, telemetry, cache, tasks)
    }

    fn build(
        config: ShimConfig,
        telemetry: TelemetryEmitter,
        cache: Arc<dyn KvStore>,
        tasks: BackgroundTasks,
    ) -> Result<Self, ServerError> {
        let host_router = Arc::new(HostRouter::from_config(&config.routing)?);
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let analytics = AnalyticsClient::new(&config.analytics);
        let gateway = Arc::new(ReportingGateway::new(&config, analytics, cache));

        let state = AppState {
            router: host_router,
            client,
            telemetry: config.telemetry.enabled.then_some(telemetry),
            gateway,
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            tasks,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ShimConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(shim_handler))
            .route("/", any(shim_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires, then drain background telemetry.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(wait_for(shutdown))
            .await?;

        let drained = self
            .tasks
            .drain_timeout(Duration::from_secs(self.config.timeouts.drain_secs))
            .await;
        tracing::info!(drained, "HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Barrier for detached telemetry writes.
    pub fn background_tasks(&self) -> &BackgroundTasks {
        &self.tasks
    }
}

/// Main handler.
/// Flags PHP probes, serves reporting endpoints, forwards the rest.
async fn shim_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers());
    let path = request.uri().path().to_string();
    let method = request.method().to_string();

    if is_php_path(&path) {
        if let Some(telemetry) = &state.telemetry {
            tracing::info!(request_id = %request_id, path = %path, "PHP probe detected");
            telemetry.emit(&path, request.headers(), &request_id);
        }
    }

    if is_reporting_path(&path, state.gateway.prefix()) {
        let response = state
            .gateway
            .handle(&path, request.headers(), &request_id)
            .await;
        metrics::record_request(&method, response.status().as_u16(), "reporting", start_time);
        return response;
    }

    let target = state.router.route(request.headers(), request.uri()).clone();
    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        destination = target.label(),
        "Forwarding request"
    );

    let response = forward(&state.client, &target, request, &request_id).await;
    metrics::record_request(&method, response.status().as_u16(), target.label(), start_time);
    response
}
