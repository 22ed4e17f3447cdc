//! Shard Cache demo
//!
//! Walks through the cache features: sharded set/get, LFU eviction, TTL
//! expiry and event-driven invalidation. Configuration comes from the
//! `CACHE_*` environment variables.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shard_cache::events::{ITEM_ADDED, ITEM_DELETED};
use shard_cache::{
    spawn_sweep_task, CacheConfig, CacheEngine, Context, Event, EventHub, LfuEviction,
    ShardedCache,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shard_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let hub = Arc::new(EventHub::new());
    let config = CacheConfig::from_env().with_event_hub(Arc::clone(&hub));
    info!(?config, "Configuration loaded");

    let cache = Arc::new(ShardedCache::new(config.clone()).context("building sharded cache")?);
    let sweep = config
        .sweep_interval
        .map(|interval| spawn_sweep_task(Arc::clone(&cache), interval));

    register_listeners(&hub, &cache);

    let ctx = Context::background();
    sharded_round_trip(&cache, &ctx)?;
    invalidate_by_event(&cache, &hub, &ctx)?;
    lfu_eviction(&ctx)?;
    ttl_expiry(&ctx).await?;

    info!(
        stats = %serde_json::to_string(&cache.stats())?,
        "Sharded cache statistics"
    );

    if let Some(handle) = sweep {
        handle.abort();
        warn!("Sweep task aborted");
    }
    Ok(())
}

fn register_listeners(hub: &EventHub, cache: &Arc<ShardedCache>) {
    hub.register_fn(ITEM_ADDED, |event| {
        info!(key = ?event.data_str(), "Item added");
        Ok(())
    });
    hub.register_fn(ITEM_DELETED, |event| {
        info!(key = ?event.data_str(), "Item deleted");
        Ok(())
    });

    let weak = Arc::downgrade(cache);
    hub.register_fn("invalidateUser", move |event| {
        let key = event
            .data_str()
            .ok_or_else(|| anyhow::anyhow!("invalidateUser payload must be a key"))?;
        if let Some(cache) = weak.upgrade() {
            cache.delete(&Context::background(), key)?;
        }
        Ok(())
    });
}

fn sharded_round_trip(cache: &ShardedCache, ctx: &Context) -> anyhow::Result<()> {
    cache.set(ctx, "user:123", "John Doe", 1, "default")?;
    let found = cache.get(ctx, "user:123")?;
    info!(
        shard = cache.shard_for("user:123"),
        value = ?found,
        "Sharded round trip"
    );

    cache.delete(ctx, "user:123")?;
    info!(found = cache.get(ctx, "user:123")?.is_some(), "After delete");
    Ok(())
}

fn invalidate_by_event(
    cache: &ShardedCache,
    hub: &EventHub,
    ctx: &Context,
) -> anyhow::Result<()> {
    cache.set(
        ctx,
        "user1",
        json!({"name": "Alice", "email": "alice@example.com", "age": 30}),
        1,
        "struct",
    )?;
    info!(found = cache.get(ctx, "user1")?.is_some(), "Before invalidation");

    hub.trigger_event(&Event::new("invalidateUser", "user1"))?;

    info!(found = cache.get(ctx, "user1")?.is_some(), "After invalidation");
    Ok(())
}

fn lfu_eviction(ctx: &Context) -> anyhow::Result<()> {
    let config = CacheConfig::default()
        .with_max_items(2)
        .with_eviction_policy(Arc::new(LfuEviction));
    let engine = CacheEngine::new(config)?;

    engine.set(ctx, "key1", "value1", 1, "default")?;
    engine.set(ctx, "key2", "value2", 1, "default")?;
    engine.get(ctx, "key1")?;
    engine.get(ctx, "key1")?;
    engine.set(ctx, "key3", "value3", 1, "default")?;

    for key in ["key1", "key2", "key3"] {
        info!(key, present = engine.get(ctx, key)?.is_some(), "LFU eviction");
    }
    Ok(())
}

async fn ttl_expiry(ctx: &Context) -> anyhow::Result<()> {
    let config = CacheConfig::default().with_ttl_override("session", Duration::from_millis(200));
    let engine = CacheEngine::new(config)?;

    engine.set(ctx, "session:1", "token", 1, "session")?;
    info!(present = engine.get(ctx, "session:1")?.is_some(), "Fresh session");

    tokio::time::sleep(Duration::from_millis(300)).await;
    info!(present = engine.get(ctx, "session:1")?.is_some(), "Expired session");
    Ok(())
}
