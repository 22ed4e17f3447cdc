//! Configuration Module
//!
//! Describes how cache engines are built: TTLs, capacity, eviction policy and
//! the optional event hub and serializer collaborators.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::cache::{policy_from_name, EvictionPolicy, LruEviction};
use crate::error::{CacheError, Result};
use crate::events::EventHub;
use crate::serializer::Serializer;

/// Default TTL for categories without an override
pub const DEFAULT_BASE_TTL: Duration = Duration::from_secs(10 * 60);

/// Default per-engine item limit
pub const DEFAULT_MAX_ITEMS: usize = 100;

/// Default shard count for [`ShardedCache`](crate::sharded::ShardedCache)
pub const DEFAULT_NUM_SHARDS: usize = 8;

/// Cache configuration.
///
/// Shared read-only by every engine built from it; cloning is cheap since the
/// collaborators are behind `Arc`.
#[derive(Clone)]
pub struct CacheConfig {
    /// TTL used when the category has no override
    pub base_ttl: Duration,
    /// Maximum number of entries per engine
    pub max_items: usize,
    /// Category -> TTL overrides
    pub ttl_overrides: HashMap<String, Duration>,
    /// Victim selection strategy
    pub eviction_policy: Arc<dyn EvictionPolicy>,
    /// Receives `itemAdded` / `itemDeleted` events when set
    pub event_hub: Option<Arc<EventHub>>,
    /// Decodes stored payloads on read when set
    pub serializer: Option<Arc<dyn Serializer>>,
    /// Number of shards for the sharded router
    pub num_shards: usize,
    /// Period of the optional background expiry sweep
    pub sweep_interval: Option<Duration>,
}

impl CacheConfig {
    /// Creates a configuration loaded from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_BASE_TTL_SECS` - Base TTL in seconds (default: 600)
    /// - `CACHE_MAX_ITEMS` - Maximum items per engine (default: 100)
    /// - `CACHE_NUM_SHARDS` - Shard count (default: 8)
    /// - `CACHE_EVICTION_POLICY` - `lru` or `lfu` (default: lru)
    /// - `CACHE_SWEEP_INTERVAL_SECS` - Background sweep period, unset disables it
    ///
    /// Unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_ttl: env_parse::<u64>("CACHE_BASE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.base_ttl),
            max_items: env_parse("CACHE_MAX_ITEMS").unwrap_or(defaults.max_items),
            num_shards: env_parse("CACHE_NUM_SHARDS").unwrap_or(defaults.num_shards),
            eviction_policy: env::var("CACHE_EVICTION_POLICY")
                .ok()
                .and_then(|name| match policy_from_name(&name) {
                    Ok(policy) => Some(policy),
                    Err(e) => {
                        warn!(error = %e, "Ignoring CACHE_EVICTION_POLICY");
                        None
                    }
                })
                .unwrap_or(defaults.eviction_policy),
            sweep_interval: env_parse::<u64>("CACHE_SWEEP_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            ..defaults
        }
    }

    /// Sets the base TTL.
    pub fn with_base_ttl(mut self, ttl: Duration) -> Self {
        self.base_ttl = ttl;
        self
    }

    /// Sets the per-engine item limit.
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    /// Adds or replaces the TTL override for `category`.
    pub fn with_ttl_override(mut self, category: impl Into<String>, ttl: Duration) -> Self {
        self.ttl_overrides.insert(category.into(), ttl);
        self
    }

    /// Sets the eviction policy.
    pub fn with_eviction_policy(mut self, policy: Arc<dyn EvictionPolicy>) -> Self {
        self.eviction_policy = policy;
        self
    }

    /// Attaches an event hub.
    pub fn with_event_hub(mut self, hub: Arc<EventHub>) -> Self {
        self.event_hub = Some(hub);
        self
    }

    /// Attaches a serializer.
    pub fn with_serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = Some(serializer);
        self
    }

    /// Sets the shard count.
    pub fn with_num_shards(mut self, num_shards: usize) -> Self {
        self.num_shards = num_shards;
        self
    }

    /// Enables the background sweep at the given period.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    // == TTL Resolution ==
    /// Returns the TTL for `category`: its override if present, else the base TTL.
    pub fn ttl_for(&self, category: &str) -> Duration {
        self.ttl_overrides
            .get(category)
            .copied()
            .unwrap_or(self.base_ttl)
    }

    // == Validation ==
    /// Rejects values an engine or router cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_items == 0 {
            return Err(CacheError::InvalidConfig(
                "max_items must be at least 1".to_string(),
            ));
        }
        if self.num_shards == 0 {
            return Err(CacheError::InvalidConfig(
                "num_shards must be at least 1".to_string(),
            ));
        }
        if self.sweep_interval == Some(Duration::ZERO) {
            return Err(CacheError::InvalidConfig(
                "sweep_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            base_ttl: DEFAULT_BASE_TTL,
            max_items: DEFAULT_MAX_ITEMS,
            ttl_overrides: HashMap::new(),
            eviction_policy: Arc::new(LruEviction),
            event_hub: None,
            serializer: None,
            num_shards: DEFAULT_NUM_SHARDS,
            sweep_interval: None,
        }
    }
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("base_ttl", &self.base_ttl)
            .field("max_items", &self.max_items)
            .field("ttl_overrides", &self.ttl_overrides)
            .field("eviction_policy", &self.eviction_policy.name())
            .field("event_hub", &self.event_hub.is_some())
            .field("serializer", &self.serializer)
            .field("num_shards", &self.num_shards)
            .field("sweep_interval", &self.sweep_interval)
            .finish()
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = name, value = %raw, "Ignoring unparsable environment value");
            None
        }
    }
}
