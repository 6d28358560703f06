//! Chunked seal/open for payloads at or above the in-memory threshold.
//!
//! Frames on the wire are `u32` little-endian length prefix followed by a
//! bincode-encoded `StreamHeader` or `StreamChunk`. Each chunk's nonce is
//! the header's random 8-byte base concatenated with a big-endian chunk
//! counter, and `is_last` rides along as AEAD associated data so dropping
//! the final chunk (truncation) fails authentication instead of silently
//! producing short output.

use chacha20poly1305::aead::{AeadInPlace, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key as ChaChaKey, Nonce as ChaChaNonce};
use crypto_box::aead::Aead as _;
use crypto_box::{PublicKey as BoxPublicKey, SalsaBox, SecretKey as BoxSecretKey};
use keybase_types::{Kid, MessageInfo};
use rand::rngs::OsRng;
use rand::RngCore;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::CryptoError;
use crate::keyring::Keyring;
use crate::message::{RecipientSlot, StreamChunk, StreamHeader};
use crate::message::VERSION;

pub const CHUNK_SIZE: usize = 1024 * 1024;

async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, bytes: &[u8]) -> Result<(), CryptoError> {
    writer.write_all(&(bytes.len() as u32).to_le_bytes()).await?;
    writer.write_all(bytes).await?;
    Ok(())
}

async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>, CryptoError> {
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_le_bytes(len_bytes) as usize;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(Some(buf))
}

/// Fills `buf` from `reader` until full or EOF, returning the number of
/// bytes actually read. A plain `read()` may return short of a full buffer
/// even mid-stream, so chunk boundaries are only meaningful once this has
/// run to EOF or capacity.
async fn fill_chunk<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> Result<usize, CryptoError> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

fn chunk_nonce(base: &[u8; 8], counter: u32) -> [u8; 12] {
    let mut nonce = [0u8; 12];
    nonce[..8].copy_from_slice(base);
    nonce[8..].copy_from_slice(&counter.to_be_bytes());
    nonce
}

pub async fn seal_stream<R, W>(
    mut reader: R,
    mut writer: W,
    sender_sk: Option<&[u8; 32]>,
    recipient_pks: &[[u8; 32]],
) -> Result<(), CryptoError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
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
        recipients.push(RecipientSlot {
            recipient_kid: Kid::from_public_key(pk_bytes).to_hex(),
            envelope_nonce: nonce_bytes,
            envelope_ciphertext,
        });
    }

    let mut nonce_base = [0u8; 8];
    OsRng.fill_bytes(&mut nonce_base);

    let header = StreamHeader {
        version: VERSION,
        anonymous,
        sender_public_key,
        recipients,
        nonce_base,
    };
    write_frame(&mut writer, &bincode::serialize(&header).unwrap()).await?;

    let cipher = ChaCha20Poly1305::new(ChaChaKey::from_slice(&session_key));
    let mut counter: u32 = 0;
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut pending = fill_chunk(&mut reader, &mut buf).await?;

    loop {
        // Peek ahead isn't available on a generic AsyncRead, so read the
        // next chunk before emitting this one to know if this is the last.
        let mut lookahead = vec![0u8; CHUNK_SIZE];
        let lookahead_n = fill_chunk(&mut reader, &mut lookahead).await?;
        let is_last = lookahead_n == 0;

        let mut plaintext = buf[..pending].to_vec();
        let nonce = chunk_nonce(&nonce_base, counter);
        let aad = [is_last as u8];
        cipher
            .encrypt_in_place(
            ChaChaNonce::from_slice(&nonce),
            &aad,
            &mut plaintext,
        )
            .map_err(|_| CryptoError::BadCiphertext)?;
        write_frame(
            &mut writer,
            &bincode::serialize(&StreamChunk {
                ciphertext: plaintext,
            })
                .unwrap(),
        )
            .await?;
        counter += 1;

        if is_last {
            break;
        }
        buf[..lookahead_n].copy_from_slice(&lookahead[..lookahead_n]);
        pending = lookahead_n;
    }

    writer.flush().await?;
    Ok(())
}

pub async fn open_stream<R, W>(
    keyring: &dyn Keyring,
    mut reader: R,
    mut writer: W,
) -> Result<MessageInfo, CryptoError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let header_bytes = read_frame(&mut reader)
        .await?
        .ok_or(CryptoError::BadFrame)?;
    let header: StreamHeader =
    bincode::deserialize(&header_bytes).map_err(|_| CryptoError::BadFrame)?;
    if header.version != VERSION {
        return Err(CryptoError::BadVersion);
    }

    let candidate_kids: Vec<String> = header
        .recipients
        .iter()
        .map(|s| s.recipient_kid.clone())
        .collect();
    let (slot_index, secret_bytes) = keyring
        .lookup_secret(&candidate_kids)
        .ok_or(CryptoError::NoMatchingKey)?;
    let slot = header
        .recipients
        .get(slot_index)
        .ok_or(CryptoError::BadFrame)?;

    let recipient_secret = BoxSecretKey::from(secret_bytes);
    let sender_public = BoxPublicKey::from(header.sender_public_key);
    let opener = SalsaBox::new(&sender_public, &recipient_secret);
    let envelope_nonce = crypto_box::Nonce::from(slot.envelope_nonce);
    let session_key = opener
        .decrypt(&envelope_nonce, slot.envelope_ciphertext.as_slice())
        .map_err(|_| CryptoError::BadTag)?;

    let cipher = ChaCha20Poly1305::new(ChaChaKey::from_slice(&session_key));
    let mut counter: u32 = 0;
    loop {
        let chunk_bytes = match read_frame(&mut reader).await? {
            Some(b) => b,
            None => return Err(CryptoError::BadFrame),
        };
        let chunk: StreamChunk =
        bincode::deserialize(&chunk_bytes).map_err(|_| CryptoError::BadFrame)?;
        let nonce = chunk_nonce(&header.nonce_base, counter);

        let mut plaintext = chunk.ciphertext;
        let is_last = match cipher.decrypt_in_place(ChaChaNonce::from_slice(&nonce), &[1u8], &mut plaintext) {
            Ok(()) => true,
            Err(_) => {
                let mut retry = plaintext.clone();
                cipher
                    .decrypt_in_place(ChaChaNonce::from_slice(&nonce), &[0u8], &mut retry)
                    .map_err(|_| CryptoError::BadTag)?;
                plaintext = retry;
                false
            }
        };
        writer.write_all(&plaintext).await?;
        counter += 1;
        if is_last {
            break;
        }
    }
    writer.flush().await?;

    let receiver_kid = Kid::from_public_key(&recipient_secret.public_key().to_bytes()).to_hex();
    let sender_kid = Kid::from_public_key(&header.sender_public_key).to_hex();
    Ok(MessageInfo {
        receiver_kid,
        sender_kid,
        is_anonymous_sender: header.anonymous,
        receiver_index: Some(slot_index),
    })
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

    fn keypair() -> ([u8; 32], [u8; 32]) {
        let sk = BoxSecretKey::generate(&mut OsRng);
        (sk.to_bytes(), *sk.public_key().as_bytes())
    }

    #[tokio::test]
    async fn streams_small_payload_round_trip() {
        let (alice_sk, _alice_pk) = keypair();
        let (bob_sk, bob_pk) = keypair();

        let plaintext = b"a payload smaller than one chunk".to_vec();
        let mut wire = Vec::new();
        seal_stream(
            plaintext.as_slice(),
            &mut wire,
            Some(&alice_sk),
            &[bob_pk],
        )
            .await
            .unwrap();

        let kid = Kid::from_public_key(&bob_pk).to_hex();
        let keyring = FakeKeyring(HashMap::from([(kid, bob_sk)]));
        let mut out = Vec::new();
        let info = open_stream(&keyring, wire.as_slice(), &mut out).await.unwrap();
        assert_eq!(out, plaintext);
        assert_eq!(info.receiver_index, Some(0));
    }

    #[tokio::test]
    async fn streams_multi_chunk_payload_matches_in_memory_result() {
        let (alice_sk, _alice_pk) = keypair();
        let (bob_sk, bob_pk) = keypair();

        let plaintext = vec![0x42u8; CHUNK_SIZE * 2 + 17];
        let mut wire = Vec::new();
        seal_stream(
            plaintext.as_slice(),
            &mut wire,
            Some(&alice_sk),
            &[bob_pk],
        )
            .await
            .unwrap();

        let kid = Kid::from_public_key(&bob_pk).to_hex();
        let keyring = FakeKeyring(HashMap::from([(kid, bob_sk)]));
        let mut out = Vec::new();
        open_stream(&keyring, wire.as_slice(), &mut out).await.unwrap();
        assert_eq!(out, plaintext);
    }
}
