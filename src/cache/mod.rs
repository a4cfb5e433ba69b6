//! Menu tree cache.
//!
//! Built trees are stored as JSON under `menu_<id>` keys so repeated
//! requests skip both the upstream fetch and the tree build.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! backend = "memory"      # none | memory | file
//! capacity = 64           # memory backend only
//! ttl_seconds = 300       # optional
//! directory = ".menutree-cache"
//! policy = "read_through" # read_through | refresh
//! ```

mod config;
mod file;
mod keys;
pub(crate) mod lock;
mod store;

use std::sync::Arc;

use tracing::debug;

pub use config::{CacheBackend, CacheConfig, CachePolicy};
pub use file::FileCacheStore;
pub use keys::{MENU_KEY_PREFIX, menu_cache_key};
pub use store::{CacheError, CacheStore, MemoryCacheStore};

/// Build the store selected by `config`, or `None` when caching is off.
pub fn open_store(config: &CacheConfig) -> Result<Option<Arc<dyn CacheStore>>, CacheError> {
    let store: Arc<dyn CacheStore> = match config.backend {
        CacheBackend::None => {
            debug!("Menu cache disabled");
            return Ok(None);
        }
        CacheBackend::Memory => Arc::new(MemoryCacheStore::new(config)),
        CacheBackend::File => Arc::new(FileCacheStore::open(&config.directory, config.ttl)?),
    };

    debug!(backend = config.backend.as_str(), "Menu cache ready");
    Ok(Some(store))
}
