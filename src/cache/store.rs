//! Cache Store Module
//!
//! The storage collaborator a [`Cache`](crate::cache::Cache) delegates to,
//! plus two adapters: an unbounded map and a capacity-bounded LRU.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tracing::debug;

use crate::cache::{Entry, EvictionObserver, KeyHandle, StoreStats};

// == Store Trait ==
/// Keyed entry storage that may evict on its own.
///
/// Any entry a store drops without being asked (capacity, cost, memory
/// pressure) must first be reported to the registered observer. Explicit
/// [`remove`](Store::remove) and [`clear`](Store::clear) are not evictions
/// and are not reported.
pub trait Store<K, V> {
    /// Stores `entry` under `key`, replacing any previous entry.
    fn set(&mut self, key: KeyHandle<K>, entry: Arc<Entry<K, V>>);

    /// Looks up the entry stored under `key`, counting it as an access.
    fn get(&mut self, key: &KeyHandle<K>) -> Option<Arc<Entry<K, V>>>;

    /// Looks up the entry stored under `key` without touching recency or stats.
    fn peek(&self, key: &KeyHandle<K>) -> Option<Arc<Entry<K, V>>>;

    /// Removes and returns the entry stored under `key`.
    fn remove(&mut self, key: &KeyHandle<K>) -> Option<Arc<Entry<K, V>>>;

    /// Registers the observer that receives evicted entries.
    fn set_observer(&mut self, observer: Arc<dyn EvictionObserver>);

    /// Number of resident entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry.
    fn clear(&mut self);
}

// == Map Store ==
/// Unbounded store backed by a `HashMap`. Never evicts.
pub struct MapStore<K, V> {
    entries: HashMap<KeyHandle<K>, Arc<Entry<K, V>>>,
}

impl<K, V> MapStore<K, V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K, V> Default for MapStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V> fmt::Debug for MapStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapStore")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<K: Eq + Hash, V> Store<K, V> for MapStore<K, V> {
    fn set(&mut self, key: KeyHandle<K>, entry: Arc<Entry<K, V>>) {
        self.entries.insert(key, entry);
    }

    fn get(&mut self, key: &KeyHandle<K>) -> Option<Arc<Entry<K, V>>> {
        self.entries.get(key).cloned()
    }

    fn peek(&self, key: &KeyHandle<K>) -> Option<Arc<Entry<K, V>>> {
        self.entries.get(key).cloned()
    }

    fn remove(&mut self, key: &KeyHandle<K>) -> Option<Arc<Entry<K, V>>> {
        self.entries.remove(key)
    }

    // Nothing is ever evicted, so there is nobody to tell.
    fn set_observer(&mut self, _observer: Arc<dyn EvictionObserver>) {}

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

// == LRU Store ==
/// Capacity-bounded store with LRU eviction, backed by [`lru::LruCache`].
///
/// Setting a new key while full evicts the least recently used entry and
/// reports it to the observer before `set` returns. Overwriting an existing
/// key never evicts. Lookups refresh recency.
pub struct LruStore<K, V> {
    /// Entries in recency order
    entries: LruCache<KeyHandle<K>, Arc<Entry<K, V>>>,
    /// Performance statistics
    stats: StoreStats,
    /// Receives autonomous evictions
    observer: Option<Arc<dyn EvictionObserver>>,
}

impl<K, V> LruStore<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: 'static,
{
    // == Constructor ==
    /// Creates a store holding at most `max_entries` entries (at least one).
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            stats: StoreStats::new(),
            observer: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Returns current store statistics.
    pub fn stats(&self) -> StoreStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Evict Oldest ==
    /// Evicts the least recently used entry, reporting it to the observer.
    ///
    /// This is the path capacity eviction takes; callers can also use it to
    /// shed load under memory pressure. Returns the evicted entry, if any.
    pub fn evict_oldest(&mut self) -> Option<Arc<Entry<K, V>>> {
        let (_, entry) = self.entries.pop_lru()?;

        if let Some(observer) = &self.observer {
            observer.will_evict(&*entry);
        }
        self.stats.record_eviction();
        self.stats.set_total_entries(self.entries.len());
        debug!(remaining = self.entries.len(), "lru store evicted an entry");

        Some(entry)
    }
}

impl<K: Eq + Hash, V> fmt::Debug for LruStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruStore")
            .field("len", &self.entries.len())
            .field("max_entries", &self.entries.cap())
            .field("stats", &self.stats)
            .field("has_observer", &self.observer.is_some())
            .finish()
    }
}

impl<K, V> Store<K, V> for LruStore<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: 'static,
{
    fn set(&mut self, key: KeyHandle<K>, entry: Arc<Entry<K, V>>) {
        // Evict through our own path so the observer hears about it;
        // `put` would drop the LRU entry silently.
        if !self.entries.contains(&key) && self.entries.len() >= self.capacity() {
            self.evict_oldest();
        }

        self.entries.put(key, entry);
        self.stats.set_total_entries(self.entries.len());
    }

    fn get(&mut self, key: &KeyHandle<K>) -> Option<Arc<Entry<K, V>>> {
        match self.entries.get(key) {
            Some(entry) => {
                let entry = Arc::clone(entry);
                self.stats.record_hit();
                Some(entry)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    fn peek(&self, key: &KeyHandle<K>) -> Option<Arc<Entry<K, V>>> {
        self.entries.peek(key).cloned()
    }

    fn remove(&mut self, key: &KeyHandle<K>) -> Option<Arc<Entry<K, V>>> {
        let removed = self.entries.pop(key)?;
        self.stats.set_total_entries(self.entries.len());
        Some(removed)
    }

    fn set_observer(&mut self, observer: Arc<dyn EvictionObserver>) {
        self.observer = Some(observer);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.stats.set_total_entries(0);
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::any::Any;

    /// Records the key of every evicted entry.
    #[derive(Default)]
    struct Recorder {
        evicted: Mutex<Vec<String>>,
    }

    impl EvictionObserver for Recorder {
        fn will_evict(&self, evicted: &dyn Any) {
            if let Some(entry) = evicted.downcast_ref::<Entry<String, String>>() {
                self.evicted.lock().push(entry.key().clone());
            }
        }
    }

    fn put<S: Store<String, String>>(store: &mut S, key: &str, value: &str) {
        store.set(
            KeyHandle::new(key.to_string()),
            Arc::new(Entry::new(key.to_string(), value.to_string())),
        );
    }

    fn fetch<S: Store<String, String>>(store: &mut S, key: &str) -> Option<String> {
        store
            .get(&KeyHandle::new(key.to_string()))
            .map(|e| e.value().clone())
    }

    fn observed_lru(max: usize) -> (LruStore<String, String>, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let mut store = LruStore::new(max);
        store.set_observer(recorder.clone());
        (store, recorder)
    }

    #[test]
    fn test_map_store_set_get_remove() {
        let mut store = MapStore::new();

        put(&mut store, "key1", "value1");
        assert_eq!(fetch(&mut store, "key1"), Some("value1".to_string()));
        assert_eq!(store.len(), 1);

        let removed = store.remove(&KeyHandle::new("key1".to_string()));
        assert_eq!(removed.map(|e| e.value().clone()), Some("value1".to_string()));
        assert!(store.is_empty());
        assert_eq!(fetch(&mut store, "key1"), None);
    }

    #[test]
    fn test_lru_store_overwrite() {
        let (mut store, recorder) = observed_lru(2);

        put(&mut store, "key1", "value1");
        put(&mut store, "key2", "value2");
        put(&mut store, "key1", "value3");

        assert_eq!(fetch(&mut store, "key1"), Some("value3".to_string()));
        assert_eq!(store.len(), 2);
        assert!(recorder.evicted.lock().is_empty());
    }

    #[test]
    fn test_lru_store_evicts_oldest_and_notifies() {
        let (mut store, recorder) = observed_lru(3);

        put(&mut store, "key1", "value1");
        put(&mut store, "key2", "value2");
        put(&mut store, "key3", "value3");
        put(&mut store, "key4", "value4");

        assert_eq!(store.len(), 3);
        assert_eq!(fetch(&mut store, "key1"), None);
        assert_eq!(*recorder.evicted.lock(), vec!["key1".to_string()]);
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_lru_store_touch_on_get() {
        let (mut store, recorder) = observed_lru(3);

        put(&mut store, "key1", "value1");
        put(&mut store, "key2", "value2");
        put(&mut store, "key3", "value3");
        fetch(&mut store, "key1");
        put(&mut store, "key4", "value4");

        assert!(fetch(&mut store, "key1").is_some());
        assert_eq!(fetch(&mut store, "key2"), None);
        assert_eq!(*recorder.evicted.lock(), vec!["key2".to_string()]);
    }

    #[test]
    fn test_lru_store_remove_does_not_notify() {
        let (mut store, recorder) = observed_lru(3);

        put(&mut store, "key1", "value1");
        store.remove(&KeyHandle::new("key1".to_string()));
        store.clear();

        assert!(recorder.evicted.lock().is_empty());
        assert_eq!(store.stats().evictions, 0);
    }

    #[test]
    fn test_lru_store_zero_capacity_holds_one() {
        let (mut store, recorder) = observed_lru(0);

        put(&mut store, "a", "1");
        put(&mut store, "b", "2");

        assert_eq!(store.capacity(), 1);
        assert_eq!(fetch(&mut store, "b"), Some("2".to_string()));
        assert_eq!(*recorder.evicted.lock(), vec!["a".to_string()]);
    }

    #[test]
    fn test_lru_store_manual_eviction() {
        let (mut store, recorder) = observed_lru(10);

        assert!(store.evict_oldest().is_none());
        put(&mut store, "a", "1");
        put(&mut store, "b", "2");

        let evicted = store.evict_oldest().unwrap();
        assert_eq!(evicted.key(), "a");
        assert_eq!(*recorder.evicted.lock(), vec!["a".to_string()]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_lru_store_peek_keeps_order() {
        let (mut store, recorder) = observed_lru(2);

        put(&mut store, "a", "1");
        put(&mut store, "b", "2");
        assert!(store.peek(&KeyHandle::new("a".to_string())).is_some());
        put(&mut store, "c", "3");

        assert_eq!(*recorder.evicted.lock(), vec!["a".to_string()]);
        assert_eq!(store.stats().hits, 0);
    }

    #[test]
    fn test_lru_store_long_run_evicts_in_recency_order() {
        let (mut store, recorder) = observed_lru(3);

        for key in ["a", "b", "c", "a", "d", "e", "c", "f"] {
            put(&mut store, key, key);
        }

        // Overwriting "a" refreshes it, so "c" goes before it.
        assert_eq!(*recorder.evicted.lock(), vec!["b", "c", "a", "d"]);
        assert_eq!(store.len(), 3);
        for key in ["c", "e", "f"] {
            assert!(store.peek(&KeyHandle::new(key.to_string())).is_some());
        }
    }

    #[test]
    fn test_lru_store_stats() {
        let mut store = LruStore::new(100);

        put(&mut store, "key1", "value1");
        fetch(&mut store, "key1");
        fetch(&mut store, "nonexistent");

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }
}
