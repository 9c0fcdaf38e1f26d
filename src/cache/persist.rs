//! Persistence Module
//!
//! Serializes a cache to an ordered list of entries and back, and round
//! trips that list through durable [`Storage`].
//!
//! On disk a cache is a JSON document:
//!
//! ```text
//! {"version": 1, "entries": [{"key": ..., "value": ...}, ...]}
//! ```

use std::hash::Hash;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::{Cache, Entry, LruStore, Store};
use crate::config::{Config, DEFAULT_MAX_ENTRIES};
use crate::error::{CacheError, Result};
use crate::storage::{DiskStorage, Storage};

/// Version tag written into every persisted cache.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a, K, V> {
    version: u32,
    entries: Vec<&'a Entry<K, V>>,
}

#[derive(Deserialize)]
struct Header {
    version: u32,
}

#[derive(Deserialize)]
struct Snapshot<K, V> {
    #[allow(dead_code)]
    version: u32,
    entries: Vec<Entry<K, V>>,
}

/// Encodes `entries` as a versioned document.
pub fn encode_entries<K, V>(entries: &[Arc<Entry<K, V>>]) -> Result<Vec<u8>>
where
    K: Serialize,
    V: Serialize,
{
    let snapshot = SnapshotRef {
        version: FORMAT_VERSION,
        entries: entries.iter().map(|e| e.as_ref()).collect(),
    };
    serde_json::to_vec(&snapshot).map_err(CacheError::Encode)
}

/// Decodes a versioned document into its entries.
///
/// Fails as a whole: either every entry parses or nothing is returned.
pub fn decode_entries<K, V>(bytes: &[u8]) -> Result<Vec<Entry<K, V>>>
where
    K: DeserializeOwned,
    V: DeserializeOwned,
{
    let header: Header = serde_json::from_slice(bytes).map_err(CacheError::Decode)?;
    if header.version != FORMAT_VERSION {
        return Err(CacheError::UnsupportedVersion {
            found: header.version,
            expected: FORMAT_VERSION,
        });
    }

    let snapshot: Snapshot<K, V> = serde_json::from_slice(bytes).map_err(CacheError::Decode)?;
    Ok(snapshot.entries)
}

impl<K, V, S> Cache<K, V, S>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + 'static,
    S: Store<K, V>,
{
    // == Serialize ==
    /// Entries for every tracked key still held by the store.
    ///
    /// Keys the store dropped without the index hearing about it yet are
    /// skipped.
    pub fn serialize(&self) -> Vec<Arc<Entry<K, V>>> {
        self.keys()
            .iter()
            .filter_map(|key| self.entry(key))
            .collect()
    }

    // == Deserialize ==
    /// Builds a cache over `store` by replaying `entries` in order.
    pub fn deserialize_into<I>(store: S, entries: I) -> Self
    where
        I: IntoIterator<Item = Entry<K, V>>,
    {
        let mut cache = Self::with_store(store);
        for entry in entries {
            cache.insert_entry(entry);
        }
        cache
    }

    /// Encodes the cache contents.
    pub fn to_bytes(&self) -> Result<Vec<u8>>
    where
        K: Serialize,
        V: Serialize,
    {
        encode_entries(&self.serialize())
    }

    /// Decodes `bytes` into a cache over `store`.
    pub fn from_bytes_with_store(bytes: &[u8], store: S) -> Result<Self>
    where
        K: DeserializeOwned,
        V: DeserializeOwned,
    {
        let entries = decode_entries(bytes)?;
        Ok(Self::deserialize_into(store, entries))
    }

    // == Save ==
    /// Writes the cache to `storage` under `name`.
    pub fn save<T: Storage>(&self, name: &str, storage: &T) -> Result<()>
    where
        K: Serialize,
        V: Serialize,
    {
        let entries = self.serialize();
        let bytes = encode_entries(&entries)?;
        storage.write(name, &bytes)?;
        info!(cache = name, entries = entries.len(), "saved cache");
        Ok(())
    }

    // == Load ==
    /// Reads the cache stored under `name` into `store`.
    pub fn load_with_store<T: Storage>(name: &str, storage: &T, store: S) -> Result<Self>
    where
        K: DeserializeOwned,
        V: DeserializeOwned,
    {
        let bytes = storage.read(name)?;
        let cache = Self::from_bytes_with_store(&bytes, store)?;
        info!(cache = name, entries = cache.len(), "loaded cache");
        Ok(cache)
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + 'static,
{
    /// Builds an LRU-backed cache from `entries`.
    ///
    /// The store is sized to hold every entry, so nothing is evicted while
    /// replaying.
    pub fn deserialize<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = Entry<K, V>>,
    {
        let entries: Vec<_> = entries.into_iter().collect();
        let capacity = entries.len().max(DEFAULT_MAX_ENTRIES);
        Self::deserialize_into(LruStore::new(capacity), entries)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self>
    where
        K: DeserializeOwned,
        V: DeserializeOwned,
    {
        Ok(Self::deserialize(decode_entries(bytes)?))
    }

    /// Reads the cache stored under `name` into a fresh LRU-backed cache
    /// sized like [`deserialize`](Cache::deserialize).
    pub fn load<T: Storage>(name: &str, storage: &T) -> Result<Self>
    where
        K: DeserializeOwned,
        V: DeserializeOwned,
    {
        let bytes = storage.read(name)?;
        let cache = Self::from_bytes(&bytes)?;
        info!(cache = name, entries = cache.len(), "loaded cache");
        Ok(cache)
    }

    /// Saves to `<cache dir>/<name>.cache`, with the directory from [`Config::from_env`].
    pub fn save_to_disk(&self, name: &str) -> Result<()>
    where
        K: Serialize,
        V: Serialize,
    {
        self.save(name, &DiskStorage::from_config(&Config::from_env()))
    }

    /// Reads the cache stored under `name` into an LRU store of `max_entries`.
    ///
    /// If the snapshot holds more entries than fit, the ones replayed first
    /// are evicted.
    pub fn load_with_capacity<T: Storage>(
        name: &str,
        storage: &T,
        max_entries: usize,
    ) -> Result<Self>
    where
        K: DeserializeOwned,
        V: DeserializeOwned,
    {
        Self::load_with_store(name, storage, LruStore::new(max_entries))
    }

    /// Loads `<cache dir>/<name>.cache` into a store of `max_entries`, both
    /// taken from [`Config::from_env`].
    pub fn load_from_disk(name: &str) -> Result<Self>
    where
        K: DeserializeOwned,
        V: DeserializeOwned,
    {
        let config = Config::from_env();
        Self::load_with_capacity(name, &DiskStorage::from_config(&config), config.max_entries)
    }
}
