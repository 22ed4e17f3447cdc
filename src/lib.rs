//! Shard Cache - an in-process key-value cache
//!
//! Per-key TTL with sliding expiration, pluggable eviction (LRU, LFU),
//! hash-based sharding across independent engines, and a synchronous event
//! hub for invalidation and side effects.
//!
//! ```
//! use shard_cache::{CacheConfig, Context, ShardedCache};
//!
//! let cache = ShardedCache::new(CacheConfig::default())?;
//! let ctx = Context::background();
//!
//! cache.set(&ctx, "user:123", "John Doe", 1, "default")?;
//! assert_eq!(cache.get(&ctx, "user:123")?, Some("John Doe".into()));
//! # Ok::<(), shard_cache::CacheError>(())
//! ```

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod serializer;
pub mod sharded;
pub mod tasks;
pub mod typed;

pub use cache::{CacheEngine, CacheEntry, CacheStats, EvictionPolicy, LfuEviction, LruEviction};
pub use config::CacheConfig;
pub use context::Context;
pub use error::{CacheError, Result};
pub use events::{Event, EventHub, EventListener};
pub use serializer::{JsonSerializer, Serializer};
pub use sharded::ShardedCache;
pub use tasks::spawn_sweep_task;
