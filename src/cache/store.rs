//! Cache Engine Module
//!
//! Single-shard cache engine: a key -> entry map behind one reader/writer lock,
//! with sliding TTL, capacity-driven eviction and event emission.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, trace};

use crate::cache::stats::StatsCounters;
use crate::cache::{CacheEntry, CacheStats};
use crate::config::CacheConfig;
use crate::context::Context;
use crate::error::{CacheError, Result};
use crate::events::{Event, ITEM_ADDED, ITEM_DELETED};
use crate::serializer::Serializer;
use crate::tasks::PurgeExpired;

// == Cache Engine ==
/// Thread-safe cache engine for one shard.
///
/// Reads take the shared lock and refresh entry metadata through atomics.
/// Writes take the exclusive lock only for the map mutation; events are
/// emitted after it is released, so listeners may call back into the engine.
pub struct CacheEngine {
    /// Key-value storage
    items: RwLock<HashMap<String, CacheEntry>>,
    /// Read-only configuration, shared with sibling shards
    config: Arc<CacheConfig>,
    /// Performance statistics
    stats: StatsCounters,
}

impl CacheEngine {
    // == Constructor ==
    /// Creates an engine from `config` after validating it.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_shared_config(Arc::new(config))
    }

    /// Creates an engine that shares an existing configuration.
    pub fn with_shared_config(config: Arc<CacheConfig>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: Arc<CacheConfig>) -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            config,
            stats: StatsCounters::default(),
        }
    }

    /// The configuration this engine was built from.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Set ==
    /// Stores `data` under `key`, replacing any existing entry.
    ///
    /// The TTL comes from the `category` override, else the base TTL. When the
    /// engine already holds `max_items` entries, one victim chosen by the
    /// eviction policy is removed inside the same critical section as the
    /// insert, so the item count never exceeds the limit.
    ///
    /// Emits `itemDeleted` for the victim (if any), then `itemAdded`. Both
    /// events are always sent once the entry is stored; if a listener fails,
    /// the first failure is returned.
    pub fn set(
        &self,
        ctx: &Context,
        key: impl Into<String>,
        data: impl Into<Value>,
        priority: i32,
        category: &str,
    ) -> Result<()> {
        ctx.check()?;

        let key = key.into();
        let ttl = self.config.ttl_for(category);
        let entry = CacheEntry::new(key.clone(), data.into(), priority, ttl);

        let evicted = {
            let mut items = self.items.write();
            let evicted = if items.len() >= self.config.max_items {
                self.evict_locked(&mut items)
            } else {
                None
            };
            items.insert(key.clone(), entry);
            evicted
        };

        debug!(key = %key, category, ttl_ms = ttl.as_millis() as u64, "Stored entry");

        let deleted = match evicted {
            Some(victim) => self.emit(ITEM_DELETED, victim),
            None => Ok(()),
        };
        let added = self.emit(ITEM_ADDED, key);
        deleted.and(added)
    }

    /// Stores `value` in the configured serializer's encoded form.
    ///
    /// Without a serializer the value is stored as is. Pairs with [`get`],
    /// which decodes through the same serializer.
    ///
    /// [`get`]: CacheEngine::get
    pub fn set_serialized(
        &self,
        ctx: &Context,
        key: impl Into<String>,
        value: Value,
        priority: i32,
        category: &str,
    ) -> Result<()> {
        let stored = match &self.config.serializer {
            Some(serializer) => {
                let bytes = serializer.serialize(&value)?;
                let text = String::from_utf8(bytes).map_err(|e| {
                    CacheError::Encode(format!("encoded form is not valid UTF-8: {}", e))
                })?;
                Value::String(text)
            }
            None => value,
        };
        self.set(ctx, key, stored, priority, category)
    }

    fn evict_locked(&self, items: &mut HashMap<String, CacheEntry>) -> Option<String> {
        let victim = self.config.eviction_policy.select_victim(items)?;
        items.remove(&victim);
        self.stats.record_eviction();
        debug!(
            victim = %victim,
            policy = self.config.eviction_policy.name(),
            "Evicted entry at capacity"
        );
        Some(victim)
    }

    // == Get ==
    /// Retrieves the payload stored under `key`.
    ///
    /// Returns `Ok(None)` for absent or expired keys. A hit bumps the access
    /// count and restarts the entry's TTL window. Expired entries stay in the
    /// map until deleted, evicted or purged.
    ///
    /// With a serializer configured the stored payload must be an encoded
    /// string; it is decoded before being returned. A payload that fails to
    /// decode counts as a miss and leaves the entry's metadata untouched.
    pub fn get(&self, ctx: &Context, key: &str) -> Result<Option<Value>> {
        ctx.check()?;

        let found = {
            let items = self.items.read();
            match items.get(key) {
                Some(entry) if !entry.is_expired() => {
                    let decoded = match &self.config.serializer {
                        Some(serializer) => {
                            decode_payload(serializer.as_ref(), key, entry.data())
                        }
                        None => Ok(entry.data().clone()),
                    };
                    if decoded.is_ok() {
                        entry.touch();
                    }
                    Some(decoded)
                }
                _ => None,
            }
        };

        match found {
            Some(Ok(data)) => {
                self.stats.record_hit();
                trace!(key, "Cache hit");
                Ok(Some(data))
            }
            Some(Err(e)) => {
                self.stats.record_miss();
                debug!(key, error = %e, "Stored payload failed to decode");
                Err(e)
            }
            None => {
                self.stats.record_miss();
                trace!(key, "Cache miss");
                Ok(None)
            }
        }
    }

    // == Delete ==
    /// Removes `key` if present and emits `itemDeleted` either way.
    pub fn delete(&self, ctx: &Context, key: &str) -> Result<()> {
        ctx.check()?;

        let removed = self.items.write().remove(key).is_some();
        debug!(key, removed, "Deleted entry");

        self.emit(ITEM_DELETED, key)
    }

    // == Evict ==
    /// Runs the configured eviction policy once against this engine.
    ///
    /// Returns the evicted key, or `None` when the engine is empty.
    pub fn evict(&self) -> Result<Option<String>> {
        let victim = self.config.eviction_policy.evict(self)?;
        if victim.is_some() {
            self.stats.record_eviction();
        }
        Ok(victim)
    }

    // == Snapshot ==
    /// Returns a copy of the current contents, expired entries included.
    pub fn snapshot(&self) -> HashMap<String, CacheEntry> {
        self.items.read().clone()
    }

    // == Purge Expired ==
    /// Removes all expired entries. No events are emitted.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let mut items = self.items.write();
        let before = items.len();
        items.retain(|_, entry| !entry.is_expired());
        before - items.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.len())
    }

    // == Length ==
    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Returns true if the engine holds no entries.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    fn emit(&self, name: &str, key: impl Into<String>) -> Result<()> {
        let Some(hub) = &self.config.event_hub else {
            return Ok(());
        };
        let key: String = key.into();
        hub.trigger_event(&Event::new(name, key))
    }
}

impl Default for CacheEngine {
    /// Engine built from [`CacheConfig::default`].
    fn default() -> Self {
        Self::build(Arc::new(CacheConfig::default()))
    }
}

impl PurgeExpired for CacheEngine {
    fn purge_expired(&self) -> usize {
        CacheEngine::purge_expired(self)
    }
}

impl fmt::Debug for CacheEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEngine")
            .field("len", &self.len())
            .field("config", &self.config)
            .finish()
    }
}

fn decode_payload(serializer: &dyn Serializer, key: &str, data: &Value) -> Result<Value> {
    match data {
        Value::String(encoded) => serializer.deserialize(encoded.as_bytes()),
        other => Err(CacheError::Decode(format!(
            "payload for key '{}' is not an encoded string (found {})",
            key,
            value_kind(other)
        ))),
    }
}

/// Human-readable name of a payload's shape.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
