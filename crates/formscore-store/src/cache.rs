//! File-backed local cache and the static identity provider.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use formscore_core::access::Principal;
use formscore_core::error::CacheError;
use formscore_core::traits::{CacheStore, IdentityProvider};

/// A durable key-value cache stored as one file per key under a
/// directory, with a total byte quota.
///
/// Keys map to file names by replacing path-hostile characters, so the
/// well-known snapshot keys land in predictable files.
pub struct FileCache {
    dir: PathBuf,
    quota_bytes: u64,
}

impl FileCache {
    /// Open (creating if needed) a cache directory with the given quota.
    pub fn open(dir: &Path, quota_bytes: u64) -> Result<Self, CacheError> {
        std::fs::create_dir_all(dir).map_err(|e| CacheError::Io(e.to_string()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            quota_bytes,
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }

    /// Total bytes currently used, excluding the given key's file.
    fn used_bytes_excluding(&self, key: &str) -> u64 {
        let excluded = self.path_for(key);
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return 0;
        };
        entries
            .flatten()
            .filter(|e| e.path() != excluded)
            .filter_map(|e| e.metadata().ok())
            .map(|m| m.len())
            .sum()
    }
}

impl CacheStore for FileCache {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        let attempted = self.used_bytes_excluding(key) + value.len() as u64;
        if attempted > self.quota_bytes {
            return Err(CacheError::QuotaExceeded {
                attempted_bytes: attempted,
                limit_bytes: self.quota_bytes,
            });
        }
        std::fs::write(self.path_for(key), value).map_err(|e| CacheError::Io(e.to_string()))
    }

    fn remove(&mut self, key: &str) {
        let _ = std::fs::remove_file(self.path_for(key));
    }
}

/// An in-memory cache, handy for tests and for running without a
/// durable cache directory.
#[derive(Default)]
pub struct MemoryCache {
    entries: HashMap<String, String>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Identity provider returning a fixed principal, as configured.
pub struct StaticIdentity {
    principal: Option<Principal>,
}

impl StaticIdentity {
    pub fn new(principal: Option<Principal>) -> Self {
        Self { principal }
    }

    pub fn anonymous() -> Self {
        Self { principal: None }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current(&self) -> Option<Principal> {
        self.principal.clone()
    }
}
