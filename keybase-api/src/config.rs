use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://keybase.io/_/api/1.0";
const DEFAULT_USER_AGENT: &str = concat!("pulumi-keybase-encryption-provider/", env!("CARGO_PKG_VERSION"));

/// API client tuning, overridable via the `KEYBASE_API_*` environment
/// variables consumed by the host tool.
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_retry_delay: Duration,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            base_retry_delay: Duration::from_millis(500),
        }
    }
}

impl ApiClientConfig {
    /// Builds a config from defaults overridden by `KEYBASE_API_TIMEOUT`
    /// (seconds), `KEYBASE_API_MAX_RETRIES`, and `KEYBASE_API_RETRY_DELAY`
    /// (milliseconds), when present and parseable.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("KEYBASE_API_TIMEOUT") {
            if let Ok(secs) = v.parse() {
                cfg.timeout = Duration::from_secs(secs);
            }
        }
        if let Ok(v) = std::env::var("KEYBASE_API_MAX_RETRIES") {
            if let Ok(n) = v.parse() {
                cfg.max_retries = n;
            }
        }
        if let Ok(v) = std::env::var("KEYBASE_API_RETRY_DELAY") {
            if let Ok(ms) = v.parse() {
                cfg.base_retry_delay = Duration::from_millis(ms);
            }
        }
        cfg
    }
}
