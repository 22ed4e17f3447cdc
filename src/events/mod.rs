//! Events Module
//!
//! Synchronous publish/subscribe hub used for invalidation and side effects.
//!
//! Delivery happens on the caller's thread, in registration order, and a
//! failing listener aborts delivery to the rest. Engines trigger events only
//! after releasing their lock, so a listener may call back into the cache.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{trace, warn};

use crate::error::{CacheError, Result};

/// Emitted by a successful `set`, payload is the key
pub const ITEM_ADDED: &str = "itemAdded";

/// Emitted by every `delete` and by eviction, payload is the key
pub const ITEM_DELETED: &str = "itemDeleted";

// == Event ==
/// A named event with an opaque payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Exact name listeners are registered under
    pub name: String,
    /// Event payload
    pub data: Value,
}

impl Event {
    /// Creates a new event.
    pub fn new(name: impl Into<String>, data: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Returns the payload as a string, the shape cache events use for keys.
    pub fn data_str(&self) -> Option<&str> {
        self.data.as_str()
    }
}

// == Event Listener ==
/// Callback invoked for each matching event.
///
/// Returning an error stops delivery and fails the triggering call.
pub trait EventListener: Send + Sync {
    /// Handles one event.
    fn on_event(&self, event: &Event) -> anyhow::Result<()>;
}

impl<F> EventListener for F
where
    F: Fn(&Event) -> anyhow::Result<()> + Send + Sync,
{
    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        self(event)
    }
}

// == Event Hub ==
/// Registry mapping event names to ordered listener lists.
#[derive(Default)]
pub struct EventHub {
    listeners: RwLock<HashMap<String, Vec<Arc<dyn EventListener>>>>,
}

impl EventHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `listener` to the list for `event_name`.
    ///
    /// Listeners run in the order they were registered. There is no way to
    /// unregister.
    pub fn register_listener(
        &self,
        event_name: impl Into<String>,
        listener: Arc<dyn EventListener>,
    ) {
        self.listeners
            .write()
            .entry(event_name.into())
            .or_default()
            .push(listener);
    }

    /// Registers a closure as a listener for `event_name`.
    pub fn register_fn<F>(&self, event_name: impl Into<String>, callback: F)
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register_listener(event_name, Arc::new(callback));
    }

    /// Number of listeners registered for `event_name`.
    pub fn listener_count(&self, event_name: &str) -> usize {
        self.listeners
            .read()
            .get(event_name)
            .map_or(0, Vec::len)
    }

    // == Trigger ==
    /// Delivers `event` to every listener registered under its exact name.
    ///
    /// No listeners is a no-op. The registry lock is released before any
    /// callback runs, so listeners may register further listeners or trigger
    /// other events.
    pub fn trigger_event(&self, event: &Event) -> Result<()> {
        let listeners = match self.listeners.read().get(&event.name) {
            Some(listeners) => listeners.clone(),
            None => return Ok(()),
        };

        trace!(event = %event.name, listeners = listeners.len(), "Delivering event");
        for listener in listeners {
            if let Err(source) = listener.on_event(event) {
                warn!(event = %event.name, error = %source, "Event listener failed");
                return Err(CacheError::Listener {
                    event: event.name.clone(),
                    source,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<String, usize> = self
            .listeners
            .read()
            .iter()
            .map(|(name, list)| (name.clone(), list.len()))
            .collect();
        f.debug_struct("EventHub").field("listeners", &counts).finish()
    }
}
