//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache operations.
///
/// A missing or expired key is not an error; lookups report it through `Option`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The call context was cancelled before the operation started
    #[error("context cancelled")]
    Cancelled,

    /// The call context's deadline passed before the operation started
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// The configured serializer could not encode a value
    #[error("Encode failed: {0}")]
    Encode(String),

    /// A stored payload could not be decoded
    #[error("Decode failed: {0}")]
    Decode(String),

    /// A typed lookup found a payload of a different shape
    #[error("Type mismatch for key {key}: expected {expected}")]
    TypeMismatch {
        /// The key that was read
        key: String,
        /// Shape the caller asked for
        expected: &'static str,
    },

    /// An event listener failed while handling an event
    #[error("Listener for event '{event}' failed")]
    Listener {
        /// Name of the event being delivered
        event: String,
        /// Error returned by the listener
        #[source]
        source: anyhow::Error,
    },

    /// Configuration values that no engine can run with
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CacheError {
    /// Returns true for errors caused by the call context rather than the cache.
    pub fn is_context_error(&self) -> bool {
        matches!(self, CacheError::Cancelled | CacheError::DeadlineExceeded)
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
