//! Integration Tests for the cache engine, router and event hub
//!
//! Exercises the public API end to end, the way an embedding application would.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::sleep;
use std::time::Duration;

use serde_json::json;
use shard_cache::events::{ITEM_ADDED, ITEM_DELETED};
use shard_cache::typed::StructCache;
use shard_cache::{
    spawn_sweep_task, CacheConfig, CacheEngine, CacheError, Context, Event, EventHub,
    LfuEviction, ShardedCache,
};

// == Helper Functions ==

fn bg() -> Context {
    Context::background()
}

// == Expiry ==

#[test]
fn test_entry_expires_after_ttl_without_access() {
    let config = CacheConfig::default().with_base_ttl(Duration::from_millis(60));
    let cache = CacheEngine::new(config).unwrap();

    cache.set(&bg(), "k", 1, 1, "default").unwrap();
    assert_eq!(cache.get(&bg(), "k").unwrap(), Some(json!(1)));

    sleep(Duration::from_millis(150));

    assert_eq!(cache.get(&bg(), "k").unwrap(), None);
}

#[test]
fn test_repeated_reads_keep_entry_alive() {
    let config = CacheConfig::default().with_base_ttl(Duration::from_millis(200));
    let cache = CacheEngine::new(config).unwrap();
    cache.set(&bg(), "k", "v", 1, "default").unwrap();

    // Total elapsed time well past a single TTL window
    for _ in 0..6 {
        sleep(Duration::from_millis(80));
        assert!(cache.get(&bg(), "k").unwrap().is_some());
    }
}

// == Eviction ==

#[test]
fn test_lfu_scenario() {
    let config = CacheConfig::default()
        .with_max_items(2)
        .with_eviction_policy(Arc::new(LfuEviction));
    let cache = CacheEngine::new(config).unwrap();

    cache.set(&bg(), "k1", "v1", 1, "default").unwrap();
    cache.set(&bg(), "k2", "v2", 1, "default").unwrap();
    cache.get(&bg(), "k1").unwrap();
    cache.get(&bg(), "k1").unwrap();

    cache.set(&bg(), "k3", "v3", 1, "default").unwrap();

    assert!(cache.get(&bg(), "k1").unwrap().is_some());
    assert!(cache.get(&bg(), "k2").unwrap().is_none());
    assert!(cache.get(&bg(), "k3").unwrap().is_some());
}

#[test]
fn test_concurrent_writers_respect_capacity() {
    let config = CacheConfig::default().with_max_items(16);
    let cache = Arc::new(CacheEngine::new(config).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for i in 0..200 {
                    cache
                        .set(&bg(), format!("w{}-{}", worker, i), i, 0, "default")
                        .unwrap();
                    assert!(cache.len() <= 16);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.len(), 16);
    assert_eq!(cache.stats().evictions, 8 * 200 - 16);
}

// == Sharding ==

#[test]
fn test_sharded_round_trip() {
    let cache = ShardedCache::new(CacheConfig::default().with_num_shards(8)).unwrap();

    cache.set(&bg(), "user:123", json!({"id": 123}), 1, "default").unwrap();

    assert_eq!(cache.get(&bg(), "user:123").unwrap(), Some(json!({"id": 123})));
}

#[test]
fn test_sharded_parallel_access() {
    let cache = Arc::new(ShardedCache::new(CacheConfig::default().with_max_items(1000)).unwrap());

    std::thread::scope(|scope| {
        for worker in 0..4 {
            let cache = &cache;
            scope.spawn(move || {
                for i in 0..100 {
                    let key = format!("{}:{}", worker, i);
                    cache.set(&bg(), key.clone(), i, 0, "default").unwrap();
                    assert_eq!(cache.get(&bg(), &key).unwrap(), Some(json!(i)));
                }
            });
        }
    });

    assert_eq!(cache.len(), 400);
}

// == Events ==

#[test]
fn test_event_invalidation_scenario() {
    let hub = Arc::new(EventHub::new());
    let cache = Arc::new(CacheEngine::new(CacheConfig::default().with_event_hub(Arc::clone(&hub))).unwrap());

    let target = Arc::clone(&cache);
    hub.register_fn("invalidateUser", move |event| {
        let key = event.data_str().unwrap_or_default();
        target.delete(&Context::background(), key)?;
        Ok(())
    });

    cache.set(&bg(), "user1", json!({"name": "Alice"}), 1, "struct").unwrap();
    assert!(cache.get(&bg(), "user1").unwrap().is_some());

    hub.trigger_event(&Event::new("invalidateUser", "user1")).unwrap();

    assert!(cache.get(&bg(), "user1").unwrap().is_none());
}

#[test]
fn test_listener_reenters_engine_without_deadlock() {
    let hub = Arc::new(EventHub::new());
    let cache = Arc::new(CacheEngine::new(CacheConfig::default().with_event_hub(Arc::clone(&hub))).unwrap());

    // Every added "primary:*" key writes a mirror entry back into the same engine
    let mirror = Arc::clone(&cache);
    hub.register_fn(ITEM_ADDED, move |event| {
        if let Some(key) = event.data_str().and_then(|k| k.strip_prefix("primary:")) {
            let ctx = Context::background();
            let value = mirror.get(&ctx, &format!("primary:{}", key))?;
            mirror.set(&ctx, format!("mirror:{}", key), value.unwrap_or_default(), 0, "default")?;
        }
        Ok(())
    });

    cache.set(&bg(), "primary:a", 42, 0, "default").unwrap();

    assert_eq!(cache.get(&bg(), "mirror:a").unwrap(), Some(json!(42)));
}

#[test]
fn test_listener_order_and_delete_idempotence() {
    let hub = Arc::new(EventHub::new());
    let order = Arc::new(Mutex::new(Vec::new()));
    for tag in ["first", "second", "third"] {
        let order = Arc::clone(&order);
        hub.register_fn(ITEM_DELETED, move |event| {
            order
                .lock()
                .unwrap()
                .push(format!("{}:{}", tag, event.data_str().unwrap_or_default()));
            Ok(())
        });
    }
    let cache = CacheEngine::new(CacheConfig::default().with_event_hub(hub)).unwrap();

    cache.delete(&bg(), "ghost").unwrap();

    assert_eq!(
        *order.lock().unwrap(),
        vec!["first:ghost", "second:ghost", "third:ghost"]
    );
}

#[test]
fn test_listener_failure_propagates_to_caller() {
    let hub = Arc::new(EventHub::new());
    hub.register_fn(ITEM_DELETED, |_| Err(anyhow::anyhow!("refusing delete")));
    let cache = CacheEngine::new(CacheConfig::default().with_event_hub(hub)).unwrap();
    cache.set(&bg(), "k", 1, 0, "default").unwrap();

    let err = cache.delete(&bg(), "k").unwrap_err();

    assert!(matches!(err, CacheError::Listener { ref event, .. } if event == ITEM_DELETED));
    // The removal itself already happened
    assert!(cache.is_empty());
}

#[test]
fn test_sharded_cache_shares_event_hub() {
    let hub = Arc::new(EventHub::new());
    let added = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&added);
    hub.register_fn(ITEM_ADDED, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let cache = ShardedCache::new(CacheConfig::default().with_event_hub(hub)).unwrap();

    for i in 0..20 {
        cache.set(&bg(), format!("key-{}", i), i, 0, "default").unwrap();
    }

    assert_eq!(added.load(Ordering::SeqCst), 20);
}

// == Cancellation ==

#[test]
fn test_cancelled_context_on_router() {
    let cache = ShardedCache::new(CacheConfig::default()).unwrap();
    let ctx = Context::background();
    ctx.cancel();

    assert!(matches!(cache.set(&ctx, "k", 1, 0, "default"), Err(CacheError::Cancelled)));
    assert!(matches!(cache.get(&ctx, "k"), Err(CacheError::Cancelled)));
    assert!(matches!(cache.delete(&ctx, "k"), Err(CacheError::Cancelled)));
    assert!(cache.is_empty());
}

// == Typed wrappers ==

#[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
struct Profile {
    name: String,
    age: u32,
}

#[test]
fn test_struct_cache_invalidated_by_event() {
    let hub = Arc::new(EventHub::new());
    let profiles: Arc<StructCache<Profile>> =
        Arc::new(StructCache::new(CacheConfig::default().with_event_hub(Arc::clone(&hub))).unwrap());

    let target = Arc::clone(&profiles);
    hub.register_fn("invalidateUser", move |event| {
        if let Some(key) = event.data_str() {
            target.delete(&Context::background(), key)?;
        }
        Ok(())
    });

    let alice = Profile { name: "Alice".to_string(), age: 30 };
    profiles.set(&bg(), "user1", &alice).unwrap();
    assert_eq!(profiles.get(&bg(), "user1").unwrap(), Some(alice));

    hub.trigger_event(&Event::new("invalidateUser", "user1")).unwrap();

    assert_eq!(profiles.get(&bg(), "user1").unwrap(), None);
}

// == Background sweep ==

#[tokio::test]
async fn test_sweep_task_over_sharded_cache() {
    let config = CacheConfig::default().with_base_ttl(Duration::from_millis(50));
    let cache = Arc::new(ShardedCache::new(config).unwrap());
    for i in 0..10 {
        cache.set(&bg(), format!("key-{}", i), i, 0, "default").unwrap();
    }
    assert_eq!(cache.len(), 10);

    let handle = spawn_sweep_task(Arc::clone(&cache), Duration::from_millis(40));
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(cache.is_empty());
    handle.abort();
}
