//! Read-through cache for reporting query results.

pub mod store;

pub use store::{effective_ttl, CacheError, KvStore, MemoryKvStore, MIN_TTL};
