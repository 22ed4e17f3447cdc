//! LFU Eviction Module
//!
//! Implements Least Frequently Used victim selection.

use std::collections::HashMap;

use crate::cache::eviction::{min_by_rank, EvictionPolicy};
use crate::cache::CacheEntry;

// == LFU Eviction ==
/// Evicts the entry with the fewest successful reads.
///
/// Full scan per eviction; ties go to the lexicographically smallest key.
#[derive(Debug, Default, Clone, Copy)]
pub struct LfuEviction;

impl EvictionPolicy for LfuEviction {
    fn name(&self) -> &'static str {
        "lfu"
    }

    fn select_victim(&self, entries: &HashMap<String, CacheEntry>) -> Option<String> {
        min_by_rank(entries, CacheEntry::access_count)
    }
}
