//! The keyring capability the crypto engine needs to decrypt. `keybase-keyring` implements this trait
//! over its in-memory loaded-secret map; the engine itself never reads a
//! key file directly.

/// A source of locally-held secret keys, queried by candidate recipient KID
/// when opening a message.
pub trait Keyring: Send + Sync {
    /// Finds a loaded secret whose derived public key matches one of
    /// `candidate_kids`, returning its slot index and raw secret bytes.
    /// This is the mechanism by which decryption picks the correct
    /// recipient automatically.
    fn lookup_secret(&self, candidate_kids: &[String]) -> Option<(usize, [u8; 32])>;

    /// Every loaded secret, as `(kid, secret_bytes)` — used by
    /// `all_secrets`-style diagnostics and by the rotation detector.
    fn all_secrets(&self) -> Vec<(String, [u8; 32])>;
}
