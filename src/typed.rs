//! Typed Cache Wrappers
//!
//! Thin wrappers that own one engine, tag every write with a fixed category
//! and hand back typed values. A stored payload of the wrong shape comes back
//! as an error rather than a panic.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::cache::{value_kind, CacheEngine};
use crate::config::CacheConfig;
use crate::context::Context;
use crate::error::{CacheError, Result};

/// Category used by [`MapCache`]
pub const MAP_CATEGORY: &str = "map";
/// Category used by [`SliceCache`]
pub const SLICE_CATEGORY: &str = "slice";
/// Category used by [`StructCache`]
pub const STRUCT_CATEGORY: &str = "struct";

const WRAPPER_PRIORITY: i32 = 1;

// == Map Cache ==
/// Cache of JSON objects, written under the `map` category.
#[derive(Debug)]
pub struct MapCache {
    cache: CacheEngine,
}

impl MapCache {
    /// Creates a wrapper around a new engine built from `config`.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Ok(Self {
            cache: CacheEngine::new(config)?,
        })
    }

    /// Stores an object under `key`.
    pub fn set(&self, ctx: &Context, key: &str, value: Map<String, Value>) -> Result<()> {
        self.cache
            .set_serialized(ctx, key, Value::Object(value), WRAPPER_PRIORITY, MAP_CATEGORY)
    }

    /// Reads the object under `key`.
    pub fn get(&self, ctx: &Context, key: &str) -> Result<Option<Map<String, Value>>> {
        match self.cache.get(ctx, key)? {
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(CacheError::TypeMismatch {
                key: key.to_string(),
                expected: "object",
            }),
            None => Ok(None),
        }
    }

    /// Deletes `key`.
    pub fn delete(&self, ctx: &Context, key: &str) -> Result<()> {
        self.cache.delete(ctx, key)
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &CacheEngine {
        &self.cache
    }
}

// == Slice Cache ==
/// Cache of JSON arrays, written under the `slice` category.
#[derive(Debug)]
pub struct SliceCache {
    cache: CacheEngine,
}

impl SliceCache {
    /// Creates a wrapper around a new engine built from `config`.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Ok(Self {
            cache: CacheEngine::new(config)?,
        })
    }

    /// Stores a sequence under `key`.
    pub fn set(&self, ctx: &Context, key: &str, value: Vec<Value>) -> Result<()> {
        self.cache
            .set_serialized(ctx, key, Value::Array(value), WRAPPER_PRIORITY, SLICE_CATEGORY)
    }

    /// Reads the sequence under `key`.
    pub fn get(&self, ctx: &Context, key: &str) -> Result<Option<Vec<Value>>> {
        match self.cache.get(ctx, key)? {
            Some(Value::Array(items)) => Ok(Some(items)),
            Some(_) => Err(CacheError::TypeMismatch {
                key: key.to_string(),
                expected: "array",
            }),
            None => Ok(None),
        }
    }

    /// Deletes `key`.
    pub fn delete(&self, ctx: &Context, key: &str) -> Result<()> {
        self.cache.delete(ctx, key)
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &CacheEngine {
        &self.cache
    }
}

// == Struct Cache ==
/// Cache of serde-compatible records, written under the `struct` category.
///
/// Values are converted to JSON on write and decoded back into `T` on read;
/// a payload that does not fit `T` is a [`CacheError::Decode`].
#[derive(Debug)]
pub struct StructCache<T> {
    cache: CacheEngine,
    _marker: PhantomData<fn() -> T>,
}

impl<T> StructCache<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a wrapper around a new engine built from `config`.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Ok(Self {
            cache: CacheEngine::new(config)?,
            _marker: PhantomData,
        })
    }

    /// Stores `value` under `key`.
    pub fn set(&self, ctx: &Context, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|e| CacheError::Encode(e.to_string()))?;
        self.cache
            .set_serialized(ctx, key, value, WRAPPER_PRIORITY, STRUCT_CATEGORY)
    }

    /// Reads and decodes the record under `key`.
    pub fn get(&self, ctx: &Context, key: &str) -> Result<Option<T>> {
        let Some(value) = self.cache.get(ctx, key)? else {
            return Ok(None);
        };
        let kind = value_kind(&value);
        serde_json::from_value(value).map(Some).map_err(|e| {
            CacheError::Decode(format!(
                "key '{}' holds {} that does not match the requested type: {}",
                key, kind, e
            ))
        })
    }

    /// Deletes `key`.
    pub fn delete(&self, ctx: &Context, key: &str) -> Result<()> {
        self.cache.delete(ctx, key)
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &CacheEngine {
        &self.cache
    }
}
