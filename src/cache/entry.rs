//! Cache Entry Module
//!
//! Defines individual cache entries with sliding TTL and access tracking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde_json::Value;

// == Cache Entry ==
/// A single cached record with its metadata.
///
/// The key, payload, TTL and priority are fixed at creation. Access count and
/// last-accessed time are atomics so a read can refresh them while only holding
/// the engine's shared lock.
#[derive(Debug)]
pub struct CacheEntry {
    key: String,
    data: Value,
    access_count: AtomicU64,
    created_at: Instant,
    /// Last access as an offset from `created_at`, in nanoseconds
    last_accessed_nanos: AtomicU64,
    ttl: Duration,
    priority: i32,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a fresh entry: access count 0, last accessed now.
    pub fn new(key: impl Into<String>, data: Value, priority: i32, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            data,
            access_count: AtomicU64::new(0),
            created_at: Instant::now(),
            last_accessed_nanos: AtomicU64::new(0),
            ttl,
            priority,
        }
    }

    /// The key this entry is stored under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The stored payload.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Number of successful reads since creation.
    pub fn access_count(&self) -> u64 {
        self.access_count.load(Ordering::Acquire)
    }

    /// Time of creation or of the latest successful read.
    pub fn last_accessed(&self) -> Instant {
        self.created_at + Duration::from_nanos(self.last_accessed_nanos.load(Ordering::Acquire))
    }

    /// TTL window assigned at creation.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Advisory priority recorded at creation. No policy reads it.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    // == Touch ==
    /// Records a successful read: bumps the access count and slides the
    /// expiry window to start now.
    pub fn touch(&self) {
        self.access_count.fetch_add(1, Ordering::AcqRel);
        self.mark_accessed_at(Instant::now());
    }

    /// Moves last-accessed forward to `at`. Never moves it backwards, so two
    /// racing readers leave the later timestamp in place.
    pub(crate) fn mark_accessed_at(&self, at: Instant) {
        let offset = at.saturating_duration_since(self.created_at).as_nanos();
        let offset = u64::try_from(offset).unwrap_or(u64::MAX);
        self.last_accessed_nanos.fetch_max(offset, Ordering::AcqRel);
    }

    // == Is Expired ==
    /// True once more than `ttl` has passed since the last access.
    ///
    /// Boundary: exactly `ttl` elapsed is still live.
    pub fn is_expired(&self) -> bool {
        self.idle_time() > self.ttl
    }

    /// Time since the last access.
    pub fn idle_time(&self) -> Duration {
        Instant::now().saturating_duration_since(self.last_accessed())
    }

    // == Time To Live ==
    /// Remaining life before the entry expires, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.ttl.saturating_sub(self.idle_time())
    }
}

impl Clone for CacheEntry {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            data: self.data.clone(),
            access_count: AtomicU64::new(self.access_count()),
            created_at: self.created_at,
            last_accessed_nanos: AtomicU64::new(self.last_accessed_nanos.load(Ordering::Acquire)),
            ttl: self.ttl,
            priority: self.priority,
        }
    }
}
