//! Key Handle Module
//!
//! Lookup token stores use in place of the caller's key.

use std::borrow::Borrow;

// == Key Handle ==
/// Wraps a user key so stores index on a type the cache controls.
///
/// Equality and hashing are exactly those of the wrapped key, so two handles
/// are equal iff their keys are.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct KeyHandle<K>(K);

impl<K> KeyHandle<K> {
    /// Wraps a key.
    pub fn new(key: K) -> Self {
        Self(key)
    }

    /// Returns the wrapped key.
    pub fn key(&self) -> &K {
        &self.0
    }

    /// Unwraps the key.
    pub fn into_inner(self) -> K {
        self.0
    }
}

impl<K> From<K> for KeyHandle<K> {
    fn from(key: K) -> Self {
        Self(key)
    }
}

// Lets a `HashMap<KeyHandle<K>, _>` be queried with a plain `&K`.
impl<K> Borrow<K> for KeyHandle<K> {
    fn borrow(&self) -> &K {
        &self.0
    }
}
