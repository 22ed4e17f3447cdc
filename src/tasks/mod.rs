//! Background Tasks Module
//!
//! Contains background tasks that run alongside the cache.
//!
//! # Tasks
//! - Expiry sweep: purges expired entries at a fixed interval

mod sweep;

pub use sweep::{spawn_sweep_task, PurgeExpired};
