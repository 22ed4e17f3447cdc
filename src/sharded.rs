//! Sharded Cache Module
//!
//! Partitions the keyspace across independent [`CacheEngine`]s.
//!
//! ```text
//! key ──▶ FNV-1a (32-bit) ──▶ hash % num_shards ──▶ shard[i]
//! ```
//!
//! Every shard is built from the same configuration but owns its own map,
//! lock and counters. Capacity and eviction are per shard; there is no global
//! bound and no rebalancing, the shard count is fixed at construction.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::cache::{CacheEngine, CacheStats};
use crate::config::CacheConfig;
use crate::context::Context;
use crate::error::Result;
use crate::tasks::PurgeExpired;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a hash over `bytes`.
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Shard index for `key` among `num_shards` shards.
///
/// Pure function of its inputs; `num_shards` must be non-zero, which the
/// router guarantees by validating its configuration.
pub(crate) fn shard_index(key: &str, num_shards: usize) -> usize {
    fnv1a_32(key.as_bytes()) as usize % num_shards
}

// == Sharded Cache ==
/// Routes each key to exactly one of N cache engines.
pub struct ShardedCache {
    shards: Vec<CacheEngine>,
}

impl ShardedCache {
    // == Constructor ==
    /// Builds `config.num_shards` engines sharing `config`.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let shards = (0..config.num_shards)
            .map(|_| CacheEngine::with_shared_config(Arc::clone(&config)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { shards })
    }

    /// Number of shards.
    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    /// Index of the shard owning `key`.
    pub fn shard_for(&self, key: &str) -> usize {
        shard_index(key, self.shards.len())
    }

    /// The engine owning `key`.
    pub fn get_shard(&self, key: &str) -> &CacheEngine {
        &self.shards[self.shard_for(key)]
    }

    /// All shards in index order.
    pub fn shards(&self) -> &[CacheEngine] {
        &self.shards
    }

    /// Stores `data` in the shard owning `key`. See [`CacheEngine::set`].
    pub fn set(
        &self,
        ctx: &Context,
        key: impl Into<String>,
        data: impl Into<Value>,
        priority: i32,
        category: &str,
    ) -> Result<()> {
        let key: String = key.into();
        self.get_shard(&key).set(ctx, key, data, priority, category)
    }

    /// Reads `key` from its shard. See [`CacheEngine::get`].
    pub fn get(&self, ctx: &Context, key: &str) -> Result<Option<Value>> {
        self.get_shard(key).get(ctx, key)
    }

    /// Deletes `key` from its shard. See [`CacheEngine::delete`].
    pub fn delete(&self, ctx: &Context, key: &str) -> Result<()> {
        self.get_shard(key).delete(ctx, key)
    }

    /// Total entries across shards, expired ones included.
    pub fn len(&self) -> usize {
        self.shards.iter().map(CacheEngine::len).sum()
    }

    /// Returns true if every shard is empty.
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(CacheEngine::is_empty)
    }

    /// Sum of every shard's statistics.
    pub fn stats(&self) -> CacheStats {
        self.shards
            .iter()
            .map(CacheEngine::stats)
            .fold(CacheStats::default(), |acc, stats| acc + stats)
    }

    /// Purges expired entries in every shard, returning the total removed.
    pub fn purge_expired(&self) -> usize {
        self.shards.iter().map(CacheEngine::purge_expired).sum()
    }
}

impl PurgeExpired for ShardedCache {
    fn purge_expired(&self) -> usize {
        ShardedCache::purge_expired(self)
    }
}

impl fmt::Debug for ShardedCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedCache")
            .field("num_shards", &self.shards.len())
            .field("len", &self.len())
            .finish()
    }
}
