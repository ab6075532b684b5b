//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, catch-all handler)
//!     → routing::matcher (PHP probe? → telemetry in background)
//!     → reporting gateway (reporting namespace, returns directly)
//!     → forward.rs (internal service or origin, per Host)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod server;

pub use request::{bearer_token, request_id, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
