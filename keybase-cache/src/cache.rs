//! Persistent, thread-safe public-key cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use keybase_types::PublicKeyRecord;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::CacheError;
use crate::file_format::{CacheFile, CacheFileEntry};
use crate::path::default_cache_path;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
}

/// On-disk public-key cache, mirrored in an in-memory `RwLock` map so
/// readers (`get`, `stats`) take a shared lock and writers (`set`,
/// `delete`, `clear`, `prune_expired`) hold exclusive access only for the
/// duration of the JSON encode + atomic rename.
pub struct PublicKeyCache {
    path: PathBuf,
    map: Arc<RwLock<HashMap<String, PublicKeyRecord>>>,
}

impl PublicKeyCache {
    /// Opens the cache at `path`, loading any existing file.
    ///
    /// A missing file is treated as an empty cache. A corrupted file is
    /// logged and treated as an empty cache too — `load()` is the explicit
    /// operation that surfaces the parse error to a caller that wants it.
    pub async fn open(path: PathBuf) -> Self {
        let cache = Self {
            path,
            map: Arc::new(RwLock::new(HashMap::new())),
        };
        if let Err(e) = cache.load().await {
            warn!("public key cache at {:?} could not be loaded, starting empty: {e}", cache.path);
        }
        cache
    }

    pub async fn open_default() -> Self {
        Self::open(default_cache_path()).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reloads the file from disk. Missing file => empty cache, no error.
    /// Malformed JSON => empty in-memory cache, error returned.
    pub async fn load(&self) -> Result<(), CacheError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                *self.map.write().await = HashMap::new();
                return Ok(());
            }
            Err(e) => return Err(CacheError::Io(e)),
        };

        let file: CacheFile = match serde_json::from_slice(&bytes) {
            Ok(f) => f,
            Err(e) => {
                *self.map.write().await = HashMap::new();
                return Err(CacheError::Corrupted(e));
            }
        };

        let mut map = HashMap::with_capacity(file.entries.len());
        for (username, entry) in &file.entries {
            match PublicKeyRecord::try_from(entry) {
                Ok(record) => {
                    map.insert(username.clone(), record);
                }
                Err(e) => warn!("dropping cache entry for {username}: {e}"),
            }
        }
        *self.map.write().await = map;
        Ok(())
    }

    /// Returns the record for `username`, or `None` if absent or expired.
    pub async fn get(&self, username: &str) -> Option<PublicKeyRecord> {
        let map = self.map.read().await;
        let record = map.get(username)?;
        if record.is_expired_at(Utc::now()) {
            None
        } else {
            Some(record.clone())
        }
    }

    /// Inserts (or overwrites) a record and persists atomically.
    pub async fn set(&self, record: PublicKeyRecord) -> Result<(), CacheError> {
        {
            let mut map = self.map.write().await;
            map.insert(record.username.clone(), record);
        }
        self.persist().await
    }

    pub async fn delete(&self, username: &str) -> Result<(), CacheError> {
        {
            let mut map = self.map.write().await;
            map.remove(username);
        }
        self.persist().await
    }

    pub async fn clear(&self) -> Result<(), CacheError> {
        {
            let mut map = self.map.write().await;
            map.clear();
        }
        self.persist().await
    }

    /// Removes every expired entry, returning the number removed.
    pub async fn prune_expired(&self) -> Result<usize, CacheError> {
        let now = Utc::now();
        let removed;
        {
            let mut map = self.map.write().await;
            let before = map.len();
            map.retain(|_, r| !r.is_expired_at(now));
            removed = before - map.len();
        }
        if removed > 0 {
            self.persist().await?;
        }
        Ok(removed)
    }

    pub async fn stats(&self) -> CacheStats {
        let now = Utc::now();
        let map = self.map.read().await;
        let total = map.len();
        let expired = map.values().filter(|r| r.is_expired_at(now)).count();
        CacheStats {
            total,
            valid: total - expired,
            expired,
        }
    }

    /// Writes the current map to a temp file in the same directory, fsyncs,
    /// then renames over the target. If the rename
    /// fails the previous file is left intact since it was never touched.
    async fn persist(&self) -> Result<(), CacheError> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        tokio::fs::create_dir_all(dir).await?;
        set_mode(dir, 0o700).await?;

        let file = {
            let map = self.map.read().await;
            CacheFile {
                entries: map
                    .iter()
                    .map(|(k, v)| (k.clone(), CacheFileEntry::from(v)))
                    .collect(),
            }
        };
        let json = serde_json::to_vec_pretty(&file).map_err(CacheError::Corrupted)?;

        let tmp_path = dir.join(format!(
            ".{}.tmp",
            self.path.file_name().and_then(|n| n.to_str()).unwrap_or("cache")
        ));

        {
            use tokio::io::AsyncWriteExt;
            let mut f = tokio::fs::File::create(&tmp_path).await?;
            f.write_all(&json).await?;
            f.sync_all().await?;
        }
        set_mode(&tmp_path, 0o600).await?;

        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[cfg(unix)]
async fn set_mode(path: &Path, mode: u32) -> Result<(), CacheError> {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(mode);
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn set_mode(_path: &Path, _mode: u32) -> Result<(), CacheError> {
    Ok(())
}
