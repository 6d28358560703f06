use std::path::PathBuf;

/// Default cache file location, overridable via `KEYBASE_CACHE_PATH`.
pub fn default_cache_path() -> PathBuf {
    if let Ok(p) = std::env::var("KEYBASE_CACHE_PATH") {
        return PathBuf::from(p);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("pulumi")
        .join("keybase_keyring_cache.json")
}
