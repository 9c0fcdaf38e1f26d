//! Cache Module
//!
//! Generic in-memory cache over a pluggable store, with an index of resident
//! keys kept in step with store-driven evictions.

mod entry;
mod facade;
mod index;
mod key;
mod persist;
mod stats;
mod store;


// Re-export public types
pub use entry::Entry;
pub use facade::Cache;
pub use index::{EvictionObserver, KeyIndex};
pub use key::KeyHandle;
pub use persist::{decode_entries, encode_entries, FORMAT_VERSION};
pub use stats::StoreStats;
pub use store::{LruStore, MapStore, Store};
