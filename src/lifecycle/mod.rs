//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Requests (background.rs):
//!     Detached telemetry write → BackgroundTasks (pending count)
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain background tasks → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Responses never wait on background tasks
//! - Shutdown waits for them, bounded by a deadline

pub mod background;
pub mod shutdown;
pub mod signals;

pub use background::BackgroundTasks;
pub use shutdown::Shutdown;
