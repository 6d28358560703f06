//! Seal/open core.
//!
//! Mirrors `privstack_crypto::envelope::{seal_dek, open_dek}`: a random
//! per-message session key is wrapped independently for every recipient,
//! and the bulk payload is encrypted once under that session key. Here the
//! per-recipient wrap uses `crypto_box` (X25519 sealed box) in place of the
//! teacher's AES key-wrap, and the payload cipher is ChaCha20-Poly1305.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key as ChaChaKey, Nonce as ChaChaNonce};
use crypto_box::aead::Aead as _;
use crypto_box::{PublicKey as BoxPublicKey, SalsaBox, SecretKey as BoxSecretKey};
use keybase_types::{Kid, MessageInfo};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::CryptoError;
use crate::keyring::Keyring;
use crate::message::{RecipientSlot, SealedMessage, VERSION};

/// Encrypts `plaintext` for every key in `recipient_pks`.
///
/// `sender_sk` is the real sender's secret key for authenticated mode, or
/// `None` to generate a throwaway ephemeral keypair and mark the message
/// anonymous.
pub fn seal(
    sender_sk: Option<&[u8; 32]>,
    recipient_pks: &[[u8; 32]],
    plaintext: &[u8],
) -> Result<SealedMessage, CryptoError> {
    let (anonymous, sender_secret) = match sender_sk {
        Some(sk) => (false, BoxSecretKey::from(*sk)),
        None => (true, BoxSecretKey::generate(&mut OsRng)),
    };
    let sender_public_key = *sender_secret.public_key().as_bytes();

    let mut session_key = [0u8; 32];
    OsRng.fill_bytes(&mut session_key);

    let mut recipients = Vec::with_capacity(recipient_pks.len());
    for pk_bytes in recipient_pks {
        let recipient_pk = BoxPublicKey::from(*pk_bytes);
        let sealer = SalsaBox::new(&recipient_pk, &sender_secret);
        let mut nonce_bytes = [0u8; 24];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = crypto_box::Nonce::from(nonce_bytes);
        let envelope_ciphertext = sealer
            .encrypt(&nonce, session_key.as_slice())
            .map_err(|_| CryptoError::BadCiphertext)?;
        let recipient_kid = Kid::from_public_key(pk_bytes).to_hex();
        recipients.push(RecipientSlot {
            recipient_kid,
            envelope_nonce: nonce_bytes,
            envelope_ciphertext,
        });
    }

    let payload_cipher = ChaCha20Poly1305::new(ChaChaKey::from_slice(&session_key));
    let mut payload_nonce = [0u8; 12];
    OsRng.fill_bytes(&mut payload_nonce);
    let payload_ciphertext = payload_cipher
        .encrypt(ChaChaNonce::from_slice(&payload_nonce), plaintext)
        .map_err(|_| CryptoError::BadCiphertext)?;

    Ok(SealedMessage {
        version: VERSION,
        anonymous,
        sender_public_key,
        recipients,
        payload_nonce,
        payload_ciphertext,
    })
}

/// Decrypts `message` using whichever loaded secret in `keyring` matches a
/// recipient slot. Returns the plaintext and header metadata describing
/// which slot matched.
pub fn open(
    keyring: &dyn Keyring,
    message: &SealedMessage,
) -> Result<(Vec<u8>, MessageInfo), CryptoError> {
    if message.version != VERSION {
        return Err(CryptoError::BadVersion);
    }
    let candidate_kids: Vec<String> = message
        .recipients
        .iter()
        .map(|slot| slot.recipient_kid.clone())
        .collect();
    let (slot_index, secret_bytes) = keyring
        .lookup_secret(&candidate_kids)
        .ok_or(CryptoError::NoMatchingKey)?;
    let slot = message
        .recipients
        .get(slot_index)
        .ok_or(CryptoError::BadFrame)?;

    let recipient_secret = BoxSecretKey::from(secret_bytes);
    let sender_public = BoxPublicKey::from(message.sender_public_key);
    let opener = SalsaBox::new(&sender_public, &recipient_secret);
    let nonce = crypto_box::Nonce::from(slot.envelope_nonce);
    let session_key = opener
        .decrypt(&nonce, slot.envelope_ciphertext.as_slice())
        .map_err(|_| CryptoError::BadTag)?;

    let payload_cipher = ChaCha20Poly1305::new(ChaChaKey::from_slice(&session_key));
    let plaintext = payload_cipher
        .decrypt(
        ChaChaNonce::from_slice(&message.payload_nonce),
        message.payload_ciphertext.as_slice(),
    )
        .map_err(|_| CryptoError::BadTag)?;

    let receiver_kid = Kid::from_public_key(&recipient_secret.public_key().to_bytes()).to_hex();
    let sender_kid = Kid::from_public_key(&message.sender_public_key).to_hex();
    let info = MessageInfo {
        receiver_kid,
        sender_kid,
        is_anonymous_sender: message.anonymous,
        receiver_index: Some(slot_index),
    };
    Ok((plaintext, info))
}
