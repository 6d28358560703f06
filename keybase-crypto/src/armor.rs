//! ASCII-armor framing.
//!
//! Wraps base62-encoded ciphertext between `BEGIN`/`END` marker lines so it
//! can travel through text-only channels. Detection between armored and
//! binary input is done by checking for the begin marker, not by sniffing
//! bytes, so a binary message that happens to start with ASCII text is
//! never misdetected.

use crate::error::CryptoError;
use keybase_types::constants::{ARMOR_BEGIN, ARMOR_END};

pub fn encode(bytes: &[u8]) -> String {
    let body = base_62::encode(bytes);
    format!("{ARMOR_BEGIN}\n{body}\n{ARMOR_END}\n")
}

pub fn decode(armored: &str) -> Result<Vec<u8>, CryptoError> {
    let trimmed = armored.trim();
    let without_begin = trimmed
        .strip_prefix(ARMOR_BEGIN)
        .ok_or(CryptoError::BadFrame)?;
    let without_end = without_begin
        .trim_start()
        .strip_suffix(ARMOR_END)
        .ok_or(CryptoError::BadFrame)?;
    let body = without_end.trim();
    base_62::decode(body).map_err(|_| CryptoError::BadFrame)
}

/// True if `data` looks like an armored message rather than raw binary.
pub fn is_armored(data: &[u8]) -> bool {
    match std::str::from_utf8(data) {
        Ok(text) => text.trim_start().starts_with(ARMOR_BEGIN),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let payload = b"some sealed message bytes \x00\x01\xff";
        let armored = encode(payload);
        assert!(is_armored(armored.as_bytes()));
        let decoded = decode(&armored).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn rejects_missing_markers() {
        let err = decode("not armored at all").unwrap_err();
        assert!(matches!(err, CryptoError::BadFrame));
    }

    #[test]
    fn binary_input_is_not_armored() {
        let data = [0xDEu8, 0xAD, 0xBE, 0xEF];
        assert!(!is_armored(&data));
    }
}
