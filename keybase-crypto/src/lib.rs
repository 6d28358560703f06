//! Multi-recipient authenticated encryption engine.
//!
//! Provides seal/open for both in-memory and streamed payloads, plus ASCII
//! armoring, over a native multi-recipient envelope format (see
//! `message::SealedMessage`): one random session key per message, wrapped
//! independently per recipient.

mod armor;
mod engine;
mod error;
mod keyring;
mod message;
mod streaming;

pub use armor::{decode as armor_decode, encode as armor_encode, is_armored};
pub use engine::{open, seal};
pub use error::CryptoError;
pub use keyring::Keyring;
pub use message::{RecipientSlot, SealedMessage, StreamHeader, VERSION};
pub use streaming::{open_stream, seal_stream, CHUNK_SIZE};

/// Encrypts `plaintext` and returns armored text.
pub fn seal_armored(
    sender_sk: Option<&[u8; 32]>,
    recipient_pks: &[[u8; 32]],
    plaintext: &[u8],
) -> Result<String, CryptoError> {
    let message = seal(sender_sk, recipient_pks, plaintext)?;
    Ok(armor_encode(&message.to_bytes()))
}

/// Decrypts an armored message produced by [`seal_armored`].
pub fn open_armored(
    keyring: &dyn Keyring,
    armored: &str,
) -> Result<(Vec<u8>, keybase_types::MessageInfo), CryptoError> {
    let bytes = armor_decode(armored)?;
    let message = SealedMessage::from_bytes(&bytes)?;
    open(keyring, &message)
}

/// Decrypts either armored or binary input, auto-detecting the framing.
pub fn open_auto(
    keyring: &dyn Keyring,
    data: &[u8],
) -> Result<(Vec<u8>, keybase_types::MessageInfo), CryptoError> {
    if is_armored(data) {
        let text = std::str::from_utf8(data).map_err(|_| CryptoError::BadFrame)?;
        open_armored(keyring, text)
    } else {
        let message = SealedMessage::from_bytes(data)?;
        open(keyring, &message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeKeyring(HashMap<String, [u8; 32]>);

    impl Keyring for FakeKeyring {
        fn lookup_secret(&self, candidate_kids: &[String]) -> Option<(usize, [u8; 32])> {
            candidate_kids
                .iter()
                .enumerate()
                .find_map(|(i, k)| self.0.get(k).map(|sk| (i, *sk)))
        }

        fn all_secrets(&self) -> Vec<(String, [u8; 32])> {
            self.0.iter().map(|(k, v)| (k.clone(), *v)).collect()
        }
    }

    #[test]
    fn seal_armored_round_trips_through_open_auto() {
        let sender_sk = crypto_box::SecretKey::generate(&mut rand::rngs::OsRng);
        let recipient_sk = crypto_box::SecretKey::generate(&mut rand::rngs::OsRng);
        let recipient_pk = *recipient_sk.public_key().as_bytes();

        let armored = seal_armored(Some(&sender_sk.to_bytes()), &[recipient_pk], b"hi").unwrap();
        assert!(is_armored(armored.as_bytes()));

        let kid = keybase_types::Kid::from_public_key(&recipient_pk).to_hex();
        let keyring = FakeKeyring(HashMap::from([(kid, recipient_sk.to_bytes())]));
        let (plaintext, info) = open_auto(&keyring, armored.as_bytes()).unwrap();
        assert_eq!(plaintext, b"hi");
        assert!(!info.is_anonymous_sender);
    }

    #[test]
    fn open_auto_handles_binary_input() {
        let sender_sk = crypto_box::SecretKey::generate(&mut rand::rngs::OsRng);
        let recipient_sk = crypto_box::SecretKey::generate(&mut rand::rngs::OsRng);
        let recipient_pk = *recipient_sk.public_key().as_bytes();

        let message = seal(Some(&sender_sk.to_bytes()), &[recipient_pk], b"binary path").unwrap();
        let kid = keybase_types::Kid::from_public_key(&recipient_pk).to_hex();
        let keyring = FakeKeyring(HashMap::from([(kid, recipient_sk.to_bytes())]));

        let (plaintext, _info) = open_auto(&keyring, &message.to_bytes()).unwrap();
        assert_eq!(plaintext, b"binary path");
    }
}
