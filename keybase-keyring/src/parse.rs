//! Secret-key file parsing and validation.

use crate::error::KeyringError;
use serde::Deserialize;

#[derive(Deserialize)]
struct EncryptionKeyFile {
    encryption_key: String,
}

/// Parses the raw bytes of a `device_eks/<username>.eks` file into a
/// validated 32-byte secret key. Accepts either a JSON object with an
/// `encryption_key` hex field, or a bare hex string with an optional `0x`
/// prefix and surrounding whitespace.
pub fn parse_secret_key(username: &str, contents: &str) -> Result<[u8; 32], KeyringError> {
    let hex_str = match serde_json::from_str::<EncryptionKeyFile>(contents) {
        Ok(file) => file.encryption_key,
        Err(_) => contents.to_string(),
    };
    let hex_str = hex_str.trim();
    let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);

    let bytes = hex::decode(hex_str).map_err(|e| KeyringError::InvalidKey {
        username: username.to_string(),
        reason: format!("not valid hex: {e}"),
    })?;

    let secret: [u8; 32] = bytes.try_into().map_err(|_| KeyringError::InvalidKey {
        username: username.to_string(),
        reason: "key must be exactly 32 bytes".to_string(),
    })?;

    if secret == [0u8; 32] {
        return Err(KeyringError::InvalidKey {
            username: username.to_string(),
            reason: "key is all-zero".to_string(),
        });
    }

    let public = crypto_box::SecretKey::from(secret).public_key();
    if public.as_bytes() == &[0u8; 32] {
        return Err(KeyringError::InvalidKey {
            username: username.to_string(),
            reason: "derived public key is all-zero".to_string(),
        });
    }

    Ok(secret)
}
