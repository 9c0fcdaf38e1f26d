//! cachectl - inspect and edit a persisted cache
//!
//! Usage:
//!   cachectl <name> get <key>
//!   cachectl <name> set <key> <value>
//!   cachectl <name> remove <key>
//!   cachectl <name> list
//!
//! Caches live in `$CACHE_DIR/<name>.cache` (see [`Config::from_env`]).

use anyhow::{bail, Context};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tracked_cache::{Cache, Config, DiskStorage};

type StringCache = Cache<String, String>;

const USAGE: &str = "usage: cachectl <name> (get <key> | set <key> <value> | remove <key> | list)";

fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tracked_cache=info,cachectl=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    debug!(
        "Configuration loaded: max_entries={}, cache_dir={}",
        config.max_entries,
        config.cache_dir.display()
    );
    let storage = DiskStorage::from_config(&config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (name, command) = match args.as_slice() {
        [name, rest @ ..] if !rest.is_empty() => (name.as_str(), rest),
        _ => bail!(USAGE),
    };

    match command {
        [cmd, key] if cmd == "get" => {
            let mut cache = open(name, &storage, &config, false)?;
            match cache.get(key) {
                Some(value) => println!("{value}"),
                None => bail!("key not found: {key}"),
            }
        }
        [cmd, key, value] if cmd == "set" => {
            let mut cache = open(name, &storage, &config, true)?;
            cache.insert(key.clone(), value.clone());
            cache
                .save(name, &storage)
                .with_context(|| format!("saving cache '{name}'"))?;
            info!("Stored key {key}");
        }
        [cmd, key] if cmd == "remove" => {
            let mut cache = open(name, &storage, &config, false)?;
            if cache.remove(key).is_none() {
                bail!("key not found: {key}");
            }
            cache
                .save(name, &storage)
                .with_context(|| format!("saving cache '{name}'"))?;
            info!("Removed key {key}");
        }
        [cmd] if cmd == "list" => {
            let cache = open(name, &storage, &config, false)?;
            let mut keys = cache.keys();
            keys.sort();
            for key in keys {
                println!("{key}");
            }
        }
        _ => bail!(USAGE),
    }

    Ok(())
}

/// Loads the named cache, or starts an empty one when `create` is set and
/// nothing has been saved yet.
fn open(
    name: &str,
    storage: &DiskStorage,
    config: &Config,
    create: bool,
) -> anyhow::Result<StringCache> {
    match StringCache::load_with_capacity(name, storage, config.max_entries) {
        Ok(cache) => Ok(cache),
        Err(e) if create && e.is_not_found() => {
            info!("Creating new cache '{name}'");
            Ok(StringCache::from_config(config))
        }
        Err(e) => Err(e).with_context(|| format!("loading cache '{name}'")),
    }
}
