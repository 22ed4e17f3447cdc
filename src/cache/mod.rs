//! Cache Module
//!
//! Provides the single-shard cache engine with TTL expiration and pluggable
//! eviction.

mod entry;
mod eviction;
mod lfu;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use eviction::{policy_from_name, EvictionPolicy};
pub use lfu::LfuEviction;
pub use lru::LruEviction;
pub use stats::CacheStats;
pub use store::CacheEngine;

pub(crate) use store::value_kind;
