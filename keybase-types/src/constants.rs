/// Plaintext/ciphertext size above which the Keeper façade switches from
/// in-memory to streaming seal/open.
pub const STREAM_THRESHOLD: usize = 10 * 1024 * 1024;

/// Default cache TTL applied when a provider URL omits `cache_ttl`.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 86_400;

/// Default in-memory TTL for a loaded secret key.
pub const DEFAULT_KEYRING_TTL_SECS: u64 = 3_600;

/// Armor framing lines bracketing a Base62-encoded ciphertext.
pub const ARMOR_BEGIN: &str = "BEGIN KEYBASE SALTPACK ENCRYPTED MESSAGE.";
pub const ARMOR_END: &str = "END KEYBASE SALTPACK ENCRYPTED MESSAGE.";
