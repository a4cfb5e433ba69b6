//! Cache configuration.
//!
//! Selects the menu cache backend and how the builder consults it, via the
//! `[cache]` table of `menutree.toml`.

use std::{num::NonZeroUsize, path::PathBuf, str::FromStr, time::Duration};

// Default values for cache configuration
pub(crate) const DEFAULT_CAPACITY: usize = 64;
pub(crate) const DEFAULT_DIRECTORY: &str = ".menutree-cache";

/// Where built menu trees are kept between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    /// No caching; every fetch goes to the entry source.
    None,
    /// In-process LRU store.
    #[default]
    Memory,
    /// One JSON file per menu under a directory.
    File,
}

impl CacheBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheBackend::None => "none",
            CacheBackend::Memory => "memory",
            CacheBackend::File => "file",
        }
    }
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(CacheBackend::None),
            "memory" => Ok(CacheBackend::Memory),
            "file" => Ok(CacheBackend::File),
            other => Err(format!(
                "unknown cache backend `{other}` (expected none|memory|file)"
            )),
        }
    }
}

/// How a builder treats an existing cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Serve a cached tree when present; build and store on miss.
    #[default]
    ReadThrough,
    /// Always rebuild from the source, then overwrite the cached tree.
    Refresh,
}

impl FromStr for CachePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "read_through" => Ok(CachePolicy::ReadThrough),
            "refresh" => Ok(CachePolicy::Refresh),
            other => Err(format!(
                "unknown cache policy `{other}` (expected read_through|refresh)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Maximum menus held by the memory backend.
    pub capacity: usize,
    /// Entries older than this are treated as absent.
    pub ttl: Option<Duration>,
    /// Root directory of the file backend.
    pub directory: PathBuf,
    pub policy: CachePolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            capacity: DEFAULT_CAPACITY,
            ttl: None,
            directory: PathBuf::from(DEFAULT_DIRECTORY),
            policy: CachePolicy::default(),
        }
    }
}

impl CacheConfig {
    pub fn is_enabled(&self) -> bool {
        self.backend != CacheBackend::None
    }

    /// Returns the capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }
}
