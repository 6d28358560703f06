//! Keybase key identifier (KID) encoding.
//!
//! A KID is a 34-byte value, serialized as 68 hex characters: a 2-byte
//! prefix (`0120` marking a NaCl box public key) followed by the 32-byte
//! Curve25519 key itself.

use std::fmt;

use thiserror::Error;

const PREFIX: [u8; 2] = [0x01, 0x20];
const LEN: usize = 34;

#[derive(Debug, Error)]
pub enum KidError {
    #[error("KID must be {expected} hex chars, got {actual}")]
    BadLength { expected: usize, actual: usize },
    #[error("KID is not valid hex: {0}")]
    BadHex(String),
    #[error("KID prefix must be 0120, got {0}")]
    BadPrefix(String),
}

/// A Keybase key identifier wrapping a Curve25519 public-key point.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Kid([u8; LEN]);

impl Kid {
    /// Builds the canonical KID for a raw Curve25519 public key.
    pub fn from_public_key(pk: &[u8; 32]) -> Self {
        let mut bytes = [0u8; LEN];
        bytes[..2].copy_from_slice(&PREFIX);
        bytes[2..].copy_from_slice(pk);
        Kid(bytes)
    }

    /// Parses a KID from its 68-hex-character wire form.
    pub fn from_hex(s: &str) -> Result<Self, KidError> {
        if s.len() != LEN * 2 {
            return Err(KidError::BadLength {
                expected: LEN * 2,
                actual: s.len(),
            });
        }
        let decoded = hex::decode(s).map_err(|e| KidError::BadHex(e.to_string()))?;
        if decoded[..2] != PREFIX {
            return Err(KidError::BadPrefix(s[..4].to_string()));
        }
        let mut bytes = [0u8; LEN];
        bytes.copy_from_slice(&decoded);
        Ok(Kid(bytes))
    }

    /// Returns the hex string form, e.g. `0120<64 hex>`.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Extracts the 32-byte Curve25519 public key carried by this KID.
    pub fn public_key(&self) -> [u8; 32] {
        let mut pk = [0u8; 32];
        pk.copy_from_slice(&self.0[2..]);
        pk
    }
}

impl fmt::Debug for Kid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kid({})", self.to_hex())
    }
}

impl fmt::Display for Kid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_hex() {
        let pk = [7u8; 32];
        let kid = Kid::from_public_key(&pk);
        let hex = kid.to_hex();
        assert_eq!(hex.len(), 68);
        assert!(hex.starts_with("0120"));
        let parsed = Kid::from_hex(&hex).unwrap();
        assert_eq!(parsed.public_key(), pk);
    }

    #[test]
    fn rejects_bad_prefix() {
        let bad = format!("ffff{}", "00".repeat(32));
        assert!(matches!(Kid::from_hex(&bad), Err(KidError::BadPrefix(_))));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(
            Kid::from_hex("0120"),
            Err(KidError::BadLength { .. })
        ));
    }
}
