//! File-backed menu cache, one `<key>.json` document per entry.
//!
//! Lets separate processes (successive CLI runs, for instance) share built
//! trees. Writes go through a temporary file in the same directory and are
//! renamed into place, so readers never observe a partial document.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use metrics::counter;
use tempfile::NamedTempFile;
use tracing::debug;

use super::store::{CacheError, CacheStore, METRIC_CACHE_EXPIRED};

const EXTENSION: &str = "json";

pub struct FileCacheStore {
    directory: PathBuf,
    ttl: Option<Duration>,
}

impl FileCacheStore {
    /// Open (creating if needed) a cache rooted at `directory`.
    pub fn open(directory: impl Into<PathBuf>, ttl: Option<Duration>) -> Result<Self, CacheError> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|source| CacheError::Io {
            path: directory.clone(),
            source,
        })?;
        Ok(Self { directory, ttl })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, CacheError> {
        let valid = !key.is_empty()
            && key
                .bytes()
                .all(|byte| byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-');
        if !valid {
            return Err(CacheError::InvalidKey(key.to_string()));
        }
        Ok(self.directory.join(format!("{key}.{EXTENSION}")))
    }

    fn is_fresh(&self, path: &Path) -> io::Result<bool> {
        let Some(ttl) = self.ttl else {
            return Ok(true);
        };
        let modified = fs::metadata(path)?.modified()?;
        // A timestamp in the future counts as just written.
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or_default();
        Ok(age <= ttl)
    }
}

impl CacheStore for FileCacheStore {
    fn has(&self, key: &str) -> bool {
        self.path_for(key)
            .is_ok_and(|path| self.is_fresh(&path).unwrap_or(false))
    }

    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.path_for(key)?;
        let io_error = |source| CacheError::Io {
            path: path.clone(),
            source,
        };

        match self.is_fresh(&path) {
            Ok(true) => {}
            Ok(false) => {
                if let Err(err) = fs::remove_file(&path) {
                    debug!(path = %path.display(), error = %err, "Expired cache file not removed");
                }
                counter!(METRIC_CACHE_EXPIRED).increment(1);
                return Ok(None);
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_error(err)),
        }

        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(err)),
        }
    }

    fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        let path = self.path_for(key)?;
        let io_error = |source| CacheError::Io {
            path: path.clone(),
            source,
        };

        let mut staged = NamedTempFile::new_in(&self.directory).map_err(io_error)?;
        staged.write_all(value.as_bytes()).map_err(io_error)?;
        staged.as_file().sync_all().map_err(io_error)?;
        staged
            .persist(&path)
            .map_err(|err| io_error(err.error))?;
        Ok(())
    }
}
