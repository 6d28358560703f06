//! Implements the crypto engine's keyring capability over the loader's in-memory map.

use keybase_crypto::Keyring;
use keybase_types::Kid;

use crate::loader::KeyringLoader;

impl Keyring for KeyringLoader {
    fn lookup_secret(&self, candidate_kids: &[String]) -> Option<(usize, [u8; 32])> {
        let loaded = self.snapshot();
        for (index, candidate) in candidate_kids.iter().enumerate() {
            if let Some(record) = loaded
                .iter()
                .find(|r| r.kid().to_hex().eq_ignore_ascii_case(candidate))
            {
                return Some((index, record.secret_key_material));
            }
        }
        None
    }

    fn all_secrets(&self) -> Vec<(String, [u8; 32])> {
        self.snapshot()
            .into_iter()
            .map(|r| (r.kid().to_hex(), r.secret_key_material))
            .collect()
    }
}

/// Creates a fresh ephemeral X25519 keypair, returning its secret bytes and
/// KID.
pub fn create_ephemeral() -> ([u8; 32], Kid) {
    let secret = crypto_box::SecretKey::generate(&mut rand::rngs::OsRng);
    let public = *secret.public_key().as_bytes();
    (secret.to_bytes(), Kid::from_public_key(&public))
}
