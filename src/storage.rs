//! Durable Storage Module
//!
//! Byte-level storage collaborator used by cache persistence. Caches are
//! stored as `<dir>/<name>.cache`.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Config;
use crate::error::{CacheError, Result};

/// File extension of persisted caches.
pub const CACHE_EXTENSION: &str = "cache";

// == Storage Trait ==
/// Named blob storage.
pub trait Storage {
    /// Reads every byte stored under `name`. Fails if nothing is stored.
    fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Replaces whatever is stored under `name` with `bytes`.
    fn write(&self, name: &str, bytes: &[u8]) -> Result<()>;
}

// == Disk Storage ==
/// Stores each cache as a single file inside one directory.
#[derive(Debug, Clone)]
pub struct DiskStorage {
    dir: PathBuf,
}

impl DiskStorage {
    /// Creates a storage rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates a storage rooted at the configured cache directory.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cache_dir.clone())
    }

    /// Returns the root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Maps a cache name to its file path.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{name}.{CACHE_EXTENSION}")))
    }
}

impl Storage for DiskStorage {
    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_for(name)?;
        debug!(path = %path.display(), "reading cache file");
        fs::read(&path).map_err(|e| CacheError::io(name, e))
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir).map_err(|e| CacheError::io(name, e))?;

        // Write beside the target then rename, so readers never see a torn file.
        let tmp = path.with_extension(format!("{CACHE_EXTENSION}.tmp"));
        let written = write_file(&tmp, bytes).and_then(|()| fs::rename(&tmp, &path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(CacheError::io(name, e));
        }

        debug!(path = %path.display(), bytes = bytes.len(), "wrote cache file");
        Ok(())
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(CacheError::InvalidName(name.to_string()));
    }
    Ok(())
}

// == Directory Resolution ==
/// Returns the platform cache directory.
///
/// Checks `XDG_CACHE_HOME`, then `$HOME/.cache` (or `%USERPROFILE%`),
/// falling back to the system temp directory.
pub fn resolve_directory() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CACHE_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg);
    }
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|v| !v.is_empty())
        .map(|home| PathBuf::from(home).join(".cache"))
        .unwrap_or_else(std::env::temp_dir)
}
