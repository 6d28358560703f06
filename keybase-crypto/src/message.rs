//! Wire representation of a sealed message.
//!
//! The real Saltpack format is an external dependency this core cannot
//! pull in, so it reimplements Saltpack's multi-recipient envelope
//! semantics natively (see DESIGN.md) using the same per-recipient
//! sealed-box idiom
//! `privstack_crypto::envelope` uses for DEK wrapping: one random session
//! key per message, independently wrapped for each recipient with
//! `crypto_box`, and the bulk payload encrypted once under that session key.

use serde::{Deserialize, Serialize};

pub const VERSION: u8 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientSlot {
    /// Hex KID of the recipient this slot is wrapped for.
    pub recipient_kid: String,
    pub envelope_nonce: [u8; 24],
    /// `crypto_box`-sealed 32-byte session key.
    pub envelope_ciphertext: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedMessage {
    pub version: u8,
    pub anonymous: bool,
    /// The real sender's public key, or an ephemeral one when `anonymous`.
    pub sender_public_key: [u8; 32],
    pub recipients: Vec<RecipientSlot>,
    pub payload_nonce: [u8; 12],
    pub payload_ciphertext: Vec<u8>,
}

impl SealedMessage {
    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("SealedMessage serialization cannot fail")
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::error::CryptoError> {
        let msg: SealedMessage =
        bincode::deserialize(bytes).map_err(|_| crate::error::CryptoError::BadCiphertext)?;
        if msg.version != VERSION {
            return Err(crate::error::CryptoError::BadVersion);
        }
        Ok(msg)
    }
}

/// Header written once at the start of a streamed message. The chunk body that follows is encrypted under the
/// same per-message session key as the in-memory form, just never held in
/// memory all at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamHeader {
    pub version: u8,
    pub anonymous: bool,
    pub sender_public_key: [u8; 32],
    pub recipients: Vec<RecipientSlot>,
    pub nonce_base: [u8; 8],
}

/// Wire representation of one streamed payload chunk. Each chunk is independently authenticated; `is_last` is
/// covered by the AEAD's associated data so truncating the stream is
/// detectable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunk {
    pub ciphertext: Vec<u8>,
}
