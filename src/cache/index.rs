//! Key Index Module
//!
//! Shadow set of the keys a cache believes are resident, reconciled with the
//! store through eviction notifications.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::cache::Entry;

// == Eviction Observer ==
/// Receives entries a store drops on its own initiative.
///
/// Stores call [`will_evict`](EvictionObserver::will_evict) synchronously,
/// before the evicted slot is released, and only for autonomous evictions
/// (capacity, cost, memory pressure). Explicit removals are not reported.
///
/// Implementations may be called from whatever thread the store runs on and
/// must not call back into the store.
pub trait EvictionObserver: Send + Sync {
    /// Called with the object about to be evicted.
    fn will_evict(&self, evicted: &dyn Any);
}

// == Key Index ==
/// Set of keys currently believed to be resident in a store.
///
/// Every mutation goes through a single lock, so the index can be shared
/// with a store that reports evictions from another thread.
pub struct KeyIndex<K, V> {
    keys: Mutex<HashSet<K>>,
    _entry: PhantomData<fn() -> V>,
}

impl<K, V> KeyIndex<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty index.
    pub fn new() -> Self {
        Self {
            keys: Mutex::new(HashSet::new()),
            _entry: PhantomData,
        }
    }

    /// Records `key` as resident. Idempotent.
    pub fn add(&self, key: K) {
        self.keys.lock().insert(key);
    }

    /// Forgets `key`. Returns whether it was tracked.
    pub fn remove(&self, key: &K) -> bool {
        self.keys.lock().remove(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.keys.lock().contains(key)
    }

    /// Snapshot of the tracked keys, in the set's iteration order.
    pub fn keys(&self) -> Vec<K> {
        self.keys.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.keys.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.lock().is_empty()
    }

    pub fn clear(&self) {
        self.keys.lock().clear();
    }

    /// Reconciles the index with an entry the store evicted.
    pub fn on_evict(&self, entry: &Entry<K, V>) {
        if self.remove(entry.key()) {
            debug!("evicted key dropped from index");
        }
    }
}

impl<K, V> Default for KeyIndex<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for KeyIndex<K, V>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyIndex")
            .field("keys", &*self.keys.lock())
            .finish()
    }
}

impl<K, V> EvictionObserver for KeyIndex<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: 'static,
{
    fn will_evict(&self, evicted: &dyn Any) {
        // Stores may hand out the entry itself or the shared pointer they hold.
        if let Some(entry) = evicted.downcast_ref::<Entry<K, V>>() {
            self.on_evict(entry);
        } else if let Some(entry) = evicted.downcast_ref::<std::sync::Arc<Entry<K, V>>>() {
            self.on_evict(entry);
        } else {
            trace!("ignoring eviction of a foreign object");
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    type Index = KeyIndex<String, String>;

    fn entry(key: &str) -> Entry<String, String> {
        Entry::new(key.to_string(), format!("value-{key}"))
    }

    #[test]
    fn test_add_is_idempotent() {
        let index = Index::new();

        index.add("A".to_string());
        index.add("A".to_string());

        assert_eq!(index.len(), 1);
        assert!(index.contains(&"A".to_string()));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let index = Index::new();
        index.add("A".to_string());

        assert!(!index.remove(&"Z".to_string()));
        assert_eq!(index.keys(), vec!["A".to_string()]);
    }

    #[test]
    fn test_eviction_removes_key() {
        let index = Index::new();
        index.add("A".to_string());
        index.add("B".to_string());

        index.will_evict(&entry("A"));

        assert!(!index.contains(&"A".to_string()));
        assert!(index.contains(&"B".to_string()));
    }

    #[test]
    fn test_eviction_accepts_shared_entry() {
        let index = Index::new();
        index.add("A".to_string());

        index.will_evict(&Arc::new(entry("A")));

        assert!(index.is_empty());
    }

    #[test]
    fn test_foreign_eviction_is_ignored() {
        let index = Index::new();
        index.add("A".to_string());

        index.will_evict(&"A".to_string());
        index.will_evict(&42u8);
        // Right shape, wrong value type.
        index.will_evict(&Entry::new("A".to_string(), 1u32));

        assert_eq!(index.keys(), vec!["A".to_string()]);
    }

    #[test]
    fn test_eviction_of_untracked_key() {
        let index = Index::new();
        index.will_evict(&entry("ghost"));
        assert!(index.is_empty());
    }

    #[test]
    fn test_concurrent_evictions_converge() {
        let index = Arc::new(KeyIndex::<u32, u32>::new());
        for k in 0..200 {
            index.add(k);
        }

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let index = Arc::clone(&index);
                thread::spawn(move || {
                    for k in (t..200).step_by(4) {
                        index.will_evict(&Entry::<u32, u32>::new(k, k));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(index.is_empty());
    }
}
