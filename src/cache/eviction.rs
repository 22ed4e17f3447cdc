//! Eviction Policy Module
//!
//! Strategy invoked when an engine is at capacity.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::cache::{CacheEngine, CacheEntry, LfuEviction, LruEviction};
use crate::context::Context;
use crate::error::{CacheError, Result};

// == Eviction Policy ==
/// Chooses at most one victim among an engine's entries.
///
/// Policies only select; the engine removes the victim. Selection must not
/// call back into the engine, because [`CacheEngine::set`] runs it while holding
/// the engine's write lock.
pub trait EvictionPolicy: Send + Sync + fmt::Debug {
    /// Short name used in logs and configuration.
    fn name(&self) -> &'static str;

    /// Returns the key to evict, or `None` when `entries` is empty.
    fn select_victim(&self, entries: &HashMap<String, CacheEntry>) -> Option<String>;

    // == Evict ==
    /// Evicts one victim from `engine` through its public operations.
    ///
    /// Selection runs on a snapshot with no lock held, then the victim is
    /// removed with [`CacheEngine::delete`], which emits `itemDeleted`.
    fn evict(&self, engine: &CacheEngine) -> Result<Option<String>> {
        let snapshot = engine.snapshot();
        match self.select_victim(&snapshot) {
            Some(victim) => {
                engine.delete(&Context::background(), &victim)?;
                Ok(Some(victim))
            }
            None => Ok(None),
        }
    }
}

/// Picks the entry with the smallest rank, breaking ties on the smallest key.
pub(crate) fn min_by_rank<R, F>(entries: &HashMap<String, CacheEntry>, rank: F) -> Option<String>
where
    R: Ord,
    F: Fn(&CacheEntry) -> R,
{
    entries
        .iter()
        .min_by(|(a_key, a), (b_key, b)| {
            rank(*a)
                .cmp(&rank(*b))
                .then_with(|| a_key.cmp(b_key))
        })
        .map(|(key, _)| key.clone())
}

// == Policy Lookup ==
/// Builds one of the bundled policies from its name (`lru` or `lfu`).
pub fn policy_from_name(name: &str) -> Result<Arc<dyn EvictionPolicy>> {
    match name.trim().to_ascii_lowercase().as_str() {
        "lru" => Ok(Arc::new(LruEviction)),
        "lfu" => Ok(Arc::new(LfuEviction)),
        other => Err(CacheError::InvalidConfig(format!(
            "unknown eviction policy '{}'",
            other
        ))),
    }
}
