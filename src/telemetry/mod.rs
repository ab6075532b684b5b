//! PHP probe telemetry.
//!
//! # Data Flow
//! ```text
//! flagged request (path, headers)
//!     → event.rs (AccessEvent: edge metadata, truncated UA, fresh id)
//!     → emitter.rs (detach onto BackgroundTasks)
//!     → sink.rs (HTTP ingestion or log)
//! ```
//!
//! Failures are logged and counted; they never reach the response.

pub mod emitter;
pub mod event;
pub mod sink;

pub use emitter::TelemetryEmitter;
pub use event::{AccessEvent, DataPoint, EdgeMetadata};
pub use sink::{EventSink, HttpEventSink, LogSink, SinkError};
