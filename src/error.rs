//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache persistence.
///
/// In-memory operations (`insert`, `get`, `remove`) never fail; only the
/// round trip through durable storage does.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Durable storage could not be read or written
    #[error("I/O error on cache '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// An entry could not be encoded
    #[error("Encode error: {0}")]
    Encode(#[source] serde_json::Error),

    /// Stored bytes are not a valid entry document
    #[error("Decode error: {0}")]
    Decode(#[source] serde_json::Error),

    /// Stored document was written by an incompatible format version
    #[error("Unsupported cache format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// Cache name cannot be mapped to a storage location
    #[error("Invalid cache name: {0:?}")]
    InvalidName(String),
}

impl CacheError {
    /// Wraps an I/O failure with the name of the cache it concerns.
    pub fn io(name: impl Into<String>, source: std::io::Error) -> Self {
        CacheError::Io {
            name: name.into(),
            source,
        }
    }

    /// Returns true if the underlying cause is a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
