//! Serializer Module
//!
//! Optional hook that converts payloads to and from an encoded byte form.

mod json;

use std::fmt;

use serde_json::Value;

use crate::error::Result;

pub use json::JsonSerializer;

// == Serializer ==
/// Encodes payloads for storage and decodes them on read.
pub trait Serializer: Send + Sync + fmt::Debug {
    /// Encodes `value` into bytes.
    fn serialize(&self, value: &Value) -> Result<Vec<u8>>;

    /// Decodes bytes produced by [`Serializer::serialize`].
    fn deserialize(&self, bytes: &[u8]) -> Result<Value>;
}
