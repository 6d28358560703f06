//! In-memory secret-key loader with TTL eviction.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{Duration, Utc};
use keybase_types::SecretKeyRecord;
use tracing::{debug, warn};

use crate::error::KeyringError;
use crate::parse::parse_secret_key;
use crate::path;

const DEFAULT_TTL_SECS: i64 = 3_600;

#[derive(Debug, Clone, Copy, Default)]
pub struct KeyringStats {
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
}

/// Reads and caches the local Keybase device secret key.
pub struct KeyringLoader {
    config_dir: std::path::PathBuf,
    ttl: RwLock<Duration>,
    entries: Arc<RwLock<HashMap<String, SecretKeyRecord>>>,
}

impl KeyringLoader {
    pub fn new(config_dir: std::path::PathBuf) -> Self {
        Self {
            config_dir,
            ttl: RwLock::new(Duration::seconds(DEFAULT_TTL_SECS)),
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn from_default_dir() -> Result<Self, KeyringError> {
        let dir = path::config_dir().ok_or(KeyringError::KeybaseUnavailable)?;
        Ok(Self::new(dir))
    }

    pub fn set_ttl(&self, ttl: Duration) {
        *self.ttl.write().unwrap() = ttl;
    }

    /// Loads the current logged-in user's secret key, determined from
    /// `KEYBASE_USERNAME` or the local Keybase `config.json`.
    pub fn load_current(&self) -> Result<SecretKeyRecord, KeyringError> {
        let username =
        path::current_username(&self.config_dir).ok_or(KeyringError::NotLoggedIn)?;
        self.load_for(&username)
    }

    /// Loads (or returns the cached, still-valid) secret key for `username`.
    pub fn load_for(&self, username: &str) -> Result<SecretKeyRecord, KeyringError> {
        let now = Utc::now();
        if let Some(record) = self.entries.read().unwrap().get(username) {
            if !record.is_expired_at(now) {
                return Ok(record.clone());
            }
        }

        let key_path = path::device_key_path(&self.config_dir, username);
        let contents = std::fs::read_to_string(&key_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                KeyringError::KeyFileMissing {
                    username: username.to_string(),
                }
            } else {
                KeyringError::Io(e)
            }
        })?;

        let secret = parse_secret_key(username, &contents)?;
        let public = *crypto_box::SecretKey::from(secret).public_key().as_bytes();
        let ttl = *self.ttl.read().unwrap();
        let record = SecretKeyRecord::new(username, secret, public, now, ttl);

        self.entries
            .write()
            .unwrap()
            .insert(username.to_string(), record.clone());
        debug!(username, "loaded secret key");
        Ok(record)
    }

    pub fn invalidate(&self, username: &str) {
        self.entries.write().unwrap().remove(username);
    }

    pub fn invalidate_all(&self) {
        self.entries.write().unwrap().clear();
    }

    /// Removes expired entries, returning how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|_, record| !record.is_expired_at(now));
        let removed = before - entries.len();
        if removed > 0 {
            warn!(removed, "evicted expired keyring entries");
        }
        removed
    }

    pub fn stats(&self) -> KeyringStats {
        let now = Utc::now();
        let entries = self.entries.read().unwrap();
        let total = entries.len();
        let expired = entries.values().filter(|r| r.is_expired_at(now)).count();
        KeyringStats {
            total,
            valid: total - expired,
            expired,
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<SecretKeyRecord> {
        self.entries.read().unwrap().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_key(dir: &std::path::Path, username: &str, secret: [u8; 32]) {
        let eks_dir = dir.join("device_eks");
        std::fs::create_dir_all(&eks_dir).unwrap();
        std::fs::write(eks_dir.join(format!("{username}.eks")), hex::encode(secret)).unwrap();
    }

    #[test]
    fn loads_and_caches_key() {
        let dir = tempdir().unwrap();
        write_key(dir.path(), "alice", [9u8; 32]);
        let loader = KeyringLoader::new(dir.path().to_path_buf());

        let record = loader.load_for("alice").unwrap();
        assert_eq!(record.secret_key_material, [9u8; 32]);

        // Second call should hit the cache, not re-read the file.
        std::fs::remove_file(dir.path().join("device_eks/alice.eks")).unwrap();
        let cached = loader.load_for("alice").unwrap();
        assert_eq!(cached.secret_key_material, [9u8; 32]);
    }

    #[test]
    fn missing_file_is_key_file_missing() {
        let dir = tempdir().unwrap();
        let loader = KeyringLoader::new(dir.path().to_path_buf());
        let err = loader.load_for("bob").unwrap_err();
        assert!(matches!(err, KeyringError::KeyFileMissing { .. }));
    }

    #[test]
    fn expired_entry_is_reloaded() {
        let dir = tempdir().unwrap();
        write_key(dir.path(), "alice", [1u8; 32]);
        let loader = KeyringLoader::new(dir.path().to_path_buf());
        loader.set_ttl(Duration::seconds(-1));

        let _ = loader.load_for("alice").unwrap();
        assert_eq!(loader.stats().expired, 1);

        write_key(dir.path(), "alice", [2u8; 32]);
        loader.set_ttl(Duration::seconds(3600));
        let reloaded = loader.load_for("alice").unwrap();
        assert_eq!(reloaded.secret_key_material, [2u8; 32]);
    }

    #[test]
    fn invalidate_forces_reload() {
        let dir = tempdir().unwrap();
        write_key(dir.path(), "alice", [3u8; 32]);
        let loader = KeyringLoader::new(dir.path().to_path_buf());
        let _ = loader.load_for("alice").unwrap();

        write_key(dir.path(), "alice", [4u8; 32]);
        loader.invalidate("alice");
        let reloaded = loader.load_for("alice").unwrap();
        assert_eq!(reloaded.secret_key_material, [4u8; 32]);
    }

    #[test]
    fn cleanup_expired_drops_stale_entries() {
        let dir = tempdir().unwrap();
        write_key(dir.path(), "alice", [5u8; 32]);
        let loader = KeyringLoader::new(dir.path().to_path_buf());
        loader.set_ttl(Duration::seconds(-1));
        let _ = loader.load_for("alice").unwrap();

        let removed = loader.cleanup_expired();
        assert_eq!(removed, 1);
        assert_eq!(loader.stats().total, 0);
    }
}
