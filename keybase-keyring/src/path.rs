//! Platform-appropriate Keybase config directory resolution.

use std::path::PathBuf;

const ENV_CONFIG_DIR: &str = "KEYBASE_CONFIG_DIR";
const ENV_USERNAME: &str = "KEYBASE_USERNAME";

/// `~/.config/keybase` on Unix-like systems, `%LOCALAPPDATA%\Keybase` on
/// Windows, overridable with `KEYBASE_CONFIG_DIR` for tests and unusual
/// installs.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        return Some(PathBuf::from(dir));
    }

    #[cfg(target_os = "windows")]
    {
        dirs::data_local_dir().map(|p| p.join("Keybase"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        dirs::home_dir().map(|p| p.join(".config").join("keybase"))
    }
}

pub fn device_key_path(config_dir: &std::path::Path, username: &str) -> PathBuf {
    config_dir.join("device_eks").join(format!("{username}.eks"))
}

/// Best-effort determination of the currently logged-in Keybase username.
/// Honors `KEYBASE_USERNAME` first, then the `username` field of
/// `config_dir/config.json`, matching how the Keybase client itself tracks
/// the active user.
pub fn current_username(config_dir: &std::path::Path) -> Option<String> {
    if let Ok(name) = std::env::var(ENV_USERNAME) {
        if !name.is_empty() {
            return Some(name);
        }
    }

    let config_json = config_dir.join("config.json");
    let contents = std::fs::read_to_string(config_json).ok()?;
    let value: serde_json::Value = serde_json::from_str(&contents).ok()?;
    value
        .get("username")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}
