//! Tracked Cache - a generic in-memory cache with eviction tracking
//!
//! Wraps a capacity-bounded store, keeps an index of resident keys in step
//! with the store's own evictions, and persists itself to disk.

pub mod cache;
pub mod config;
pub mod error;
pub mod storage;

pub use cache::{Cache, Entry, EvictionObserver, KeyIndex, LruStore, MapStore, Store};
pub use config::Config;
pub use error::{CacheError, Result};
pub use storage::{DiskStorage, Storage};
