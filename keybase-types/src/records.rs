//! Cache/keyring record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::kid::Kid;

/// Resolver output / public-key cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyRecord {
    pub username: String,
    /// Hex-encoded KID (`0120<64 hex>`).
    pub kid: String,
    /// 32-byte Curve25519 point extracted from the KID.
    pub public_key_material: [u8; 32],
    /// The "PGP bundle" field from the API — stored but never parsed.
    #[serde(default)]
    pub pgp_bundle: String,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PublicKeyRecord {
    pub fn new(
        username: impl Into<String>,
        public_key_material: [u8; 32],
        pgp_bundle: impl Into<String>,
        fetched_at: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Self {
        let kid = Kid::from_public_key(&public_key_material).to_hex();
        Self {
            username: username.into(),
            kid,
            public_key_material,
            pgp_bundle: pgp_bundle.into(),
            fetched_at,
            expires_at: fetched_at + ttl,
        }
    }

    /// A record with `now >= expires_at` is expired and treated as absent
    /// by reads but may still be returned by diagnostic calls.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Keyring loader cache entry. Key material is zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKeyRecord {
    #[zeroize(skip)]
    pub username: String,
    pub secret_key_material: [u8; 32],
    pub public_key_material: [u8; 32],
    #[zeroize(skip)]
    pub loaded_at: DateTime<Utc>,
    #[zeroize(skip)]
    pub expires_at: DateTime<Utc>,
}

impl SecretKeyRecord {
    pub fn new(
        username: impl Into<String>,
        secret_key_material: [u8; 32],
        public_key_material: [u8; 32],
        loaded_at: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            username: username.into(),
            secret_key_material,
            public_key_material,
            loaded_at,
            expires_at: loaded_at + ttl,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn kid(&self) -> Kid {
        Kid::from_public_key(&self.public_key_material)
    }
}

impl std::fmt::Debug for SecretKeyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material, even in derived-looking debug output.
        f.debug_struct("SecretKeyRecord")
            .field("username", &self.username)
            .field("loaded_at", &self.loaded_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}
