//! Analytics SQL API access.
//!
//! # Data Flow
//! ```text
//! SQL string
//!     → client.rs (bearer-authenticated POST)
//!     → query_data: `data` field as-is (canned reporting queries)
//!     → query: normalize.rs → {count, items} (ad-hoc queries)
//! ```

pub mod client;
pub mod normalize;

pub use client::{AnalyticsClient, AnalyticsError, AnalyticsResult};
pub use normalize::{normalize, QueryResult};
