//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path)
//!     → matcher.rs (PHP probe? reporting namespace?)
//!     → router.rs (host → internal service | origin)
//!
//! Route Compilation (at startup):
//!     RoutingConfig
//!     → Parse authorities
//!     → Freeze as immutable HostRouter
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path
//! - Deterministic: same input always matches same target

pub mod matcher;
pub mod router;

pub use matcher::{is_php_path, is_reporting_path, request_host, HostMatcher};
pub use router::{HostRouter, Target};
