//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cache entries.
//! Lookups already treat expired entries as absent; the sweep only frees the
//! slots they occupy.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

// == Purge Expired ==
/// A cache that can drop its expired entries in one pass.
pub trait PurgeExpired: Send + Sync {
    /// Removes expired entries and returns how many were removed.
    fn purge_expired(&self) -> usize;
}

/// Spawns a background task that periodically purges expired entries.
///
/// The task runs in an infinite loop, sleeping for `interval` between passes.
/// It must be spawned from within a tokio runtime.
///
/// # Returns
/// A JoinHandle for the spawned task, which should be aborted on shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(ShardedCache::new(CacheConfig::default())?);
/// let sweep = spawn_sweep_task(cache.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// sweep.abort();
/// ```
pub fn spawn_sweep_task<C>(cache: Arc<C>, interval: Duration) -> JoinHandle<()>
where
    C: PurgeExpired + ?Sized + 'static,
{
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "Starting expiry sweep task");

        let mut ticker = tokio::time::interval(interval);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = cache.purge_expired();

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CacheConfig, CacheEngine, Context};

    fn short_lived_engine() -> Arc<CacheEngine> {
        let config = CacheConfig::default()
            .with_ttl_override("short", Duration::from_millis(50))
            .with_base_ttl(Duration::from_secs(3600));
        Arc::new(CacheEngine::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_sweep_task_removes_expired_entries() {
        let cache = short_lived_engine();
        let ctx = Context::background();
        cache.set(&ctx, "expire_soon", "value", 0, "short").unwrap();

        let handle = spawn_sweep_task(cache.clone(), Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(cache.len(), 0, "Expired entry should have been purged");

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_preserves_valid_entries() {
        let cache = short_lived_engine();
        let ctx = Context::background();
        cache.set(&ctx, "long_lived", "value", 0, "default").unwrap();

        let handle = spawn_sweep_task(cache.clone(), Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(200)).await;

        let value = cache.get(&ctx, "long_lived").unwrap();
        assert_eq!(value, Some(serde_json::json!("value")));

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let handle = spawn_sweep_task(short_lived_engine(), Duration::from_millis(50));

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
