//! LRU Eviction Module
//!
//! Implements Least Recently Used victim selection.

use std::collections::HashMap;

use crate::cache::eviction::{min_by_rank, EvictionPolicy};
use crate::cache::CacheEntry;

// == LRU Eviction ==
/// Evicts the entry whose last access is oldest.
///
/// Full scan per eviction; ties go to the lexicographically smallest key.
#[derive(Debug, Default, Clone, Copy)]
pub struct LruEviction;

impl EvictionPolicy for LruEviction {
    fn name(&self) -> &'static str {
        "lru"
    }

    fn select_victim(&self, entries: &HashMap<String, CacheEntry>) -> Option<String> {
        min_by_rank(entries, CacheEntry::last_accessed)
    }
}
