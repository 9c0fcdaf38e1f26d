//! Cache Façade Module
//!
//! Typed access to a [`Store`] plus the [`KeyIndex`] that shadows it.

use std::hash::Hash;
use std::sync::Arc;

use crate::cache::{Entry, KeyHandle, KeyIndex, LruStore, Store, StoreStats};
use crate::config::{Config, DEFAULT_MAX_ENTRIES};

// == Cache ==
/// Generic key-value cache over a pluggable store.
///
/// The store decides what to keep. The cache records every key it inserts
/// in a [`KeyIndex`] and registers that index as the store's eviction
/// observer, so keys the store drops on its own leave the index too. The
/// index is what serialization walks.
#[derive(Debug)]
pub struct Cache<K, V, S = LruStore<K, V>> {
    store: S,
    index: Arc<KeyIndex<K, V>>,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + 'static,
{
    /// Creates a cache over an LRU store of the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    /// Creates a cache over an LRU store holding at most `max_entries`.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self::with_store(LruStore::new(max_entries))
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_capacity(config.max_entries)
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Returns the statistics of the backing LRU store.
    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }
}

impl<K, V> Default for Cache<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> Cache<K, V, S>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + 'static,
    S: Store<K, V>,
{
    // == Constructor ==
    /// Wraps `store`, registering a fresh key index as its eviction observer.
    pub fn with_store(mut store: S) -> Self {
        let index = Arc::new(KeyIndex::new());
        store.set_observer(index.clone());
        Self { store, index }
    }

    // == Insert ==
    /// Stores `value` under `key`.
    ///
    /// The store may evict another entry, or this one, to make room; either
    /// way the index reflects it once this returns.
    pub fn insert(&mut self, key: K, value: V) {
        self.insert_entry(Entry::new(key, value));
    }

    // == Get ==
    /// Returns a copy of the value stored under `key`.
    ///
    /// Consults the store only: a key still listed in the index may be gone.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let handle = KeyHandle::new(key.clone());
        self.store.get(&handle).map(|entry| entry.value().clone())
    }

    // == Remove ==
    /// Removes `key` from both the store and the index, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let handle = KeyHandle::new(key.clone());
        let removed = self.store.remove(&handle);
        self.index.remove(key);

        removed.map(|entry| match Arc::try_unwrap(entry) {
            Ok(entry) => entry.into_parts().1,
            Err(shared) => shared.value().clone(),
        })
    }

    // == Set ==
    /// Writes `Some(value)` as an insert and `None` as a removal.
    pub fn set(&mut self, key: K, value: Option<V>) {
        match value {
            Some(value) => self.insert(key, value),
            None => {
                self.remove(&key);
            }
        }
    }

    /// Returns true if the store currently holds `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.entry(key).is_some()
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Snapshot of the tracked keys.
    pub fn keys(&self) -> Vec<K> {
        self.index.keys()
    }

    /// Drops every entry and every tracked key.
    pub fn clear(&mut self) {
        self.store.clear();
        self.index.clear();
    }

    /// The index of keys believed resident.
    pub fn key_index(&self) -> &KeyIndex<K, V> {
        &self.index
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the store. Evictions triggered through it still
    /// reach the index; direct removals do not.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    // == Raw Entry Access ==
    /// Fetches the stored entry for `key` without counting an access.
    pub(crate) fn entry(&self, key: &K) -> Option<Arc<Entry<K, V>>> {
        self.store.peek(&KeyHandle::new(key.clone()))
    }

    /// Stores a complete entry and tracks its key.
    pub(crate) fn insert_entry(&mut self, entry: Entry<K, V>) {
        let key = entry.key().clone();
        // Track first: an eviction of this very entry during `set` must win.
        self.index.add(key.clone());
        self.store.set(KeyHandle::new(key), Arc::new(entry));
    }
}
