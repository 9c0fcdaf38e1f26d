//! Cache Entry Module
//!
//! Defines the immutable record a store keeps for each cached value.

use serde::{Deserialize, Serialize};

// == Entry ==
/// A cached value together with the key it was inserted under.
///
/// The key travels with the value so that an eviction observer, which only
/// sees the evicted entry, can tell which key left the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry<K, V> {
    key: K,
    value: V,
}

impl<K, V> Entry<K, V> {
    /// Creates a new entry.
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }

    /// The key this entry was stored under.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The cached value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Splits the entry into its key and value.
    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}
