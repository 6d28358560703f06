//! Keeper facade: the public Encrypt/Decrypt surface.

use keybase_api::{ApiClient, ApiClientConfig};
use keybase_cache::PublicKeyCache;
use keybase_crypto::{is_armored, open_auto, seal_armored};
use keybase_keyring::KeyringLoader;
use keybase_resolver::Resolver;
use keybase_types::{Config, MessageInfo};
use tokio_util::sync::CancellationToken;

use crate::error::ProviderError;

/// Owns a Resolver and a Keyring Loader for its lifetime. Chooses
/// streaming vs. in-memory codecs by size and always emits armored
/// ciphertext.
pub struct Keeper {
    config: Config,
    resolver: Resolver,
    keyring: KeyringLoader,
}

impl Keeper {
    pub async fn new(config: Config) -> Result<Self, ProviderError> {
        let api = ApiClient::new(ApiClientConfig::from_env());
        let cache = PublicKeyCache::open_default().await;
        let ttl = chrono::Duration::from_std(config.cache_ttl).unwrap_or(chrono::Duration::zero());
        let resolver = Resolver::new(api, cache, ttl);
        let keyring = KeyringLoader::from_default_dir()?;
        Ok(Self {
            config,
            resolver,
            keyring,
        })
    }

    pub fn with_parts(config: Config, resolver: Resolver, keyring: KeyringLoader) -> Self {
        Self {
            config,
            resolver,
            keyring,
        }
    }

    /// Encrypts `plaintext` for every configured recipient. Uses the local
    /// user's secret key when present so the message has an authenticated
    /// sender; falls back to an anonymous sender otherwise.
    pub async fn encrypt(
        &self,
        plaintext: &[u8],
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ProviderError> {
        if plaintext.is_empty() {
            return Err(ProviderError::EmptyInput);
        }

        let recipients = self
            .resolver
            .resolve(&self.config.recipients, cancel)
            .await?;
        let recipient_pks: Vec<[u8; 32]> =
        recipients.iter().map(|r| r.public_key_material).collect();

        let sender_sk = self
            .keyring
            .load_current()
            .ok()
            .map(|r| r.secret_key_material);

        if plaintext.len() > keybase_types::constants::STREAM_THRESHOLD {
            let mut sealed = Vec::new();
            keybase_crypto::seal_stream(
                plaintext,
                &mut sealed,
                sender_sk.as_ref(),
                &recipient_pks,
            )
                .await?;
            Ok(keybase_crypto::armor_encode(&sealed).into_bytes())
        } else {
            let armored = seal_armored(sender_sk.as_ref(), &recipient_pks, plaintext)?;
            Ok(armored.into_bytes())
        }
    }

    pub async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, ProviderError> {
        let (plaintext, _info) = self.decrypt_with_info(ciphertext).await?;
        Ok(plaintext)
    }

    /// Decrypts `ciphertext`, returning the parsed header alongside the
    /// plaintext. Probes for armor framing
    /// first and falls through to binary on framing failure, above and
    /// below the streaming threshold alike.
    pub async fn decrypt_with_info(
        &self,
        ciphertext: &[u8],
    ) -> Result<(Vec<u8>, MessageInfo), ProviderError> {
        if ciphertext.is_empty() {
            return Err(ProviderError::EmptyInput);
        }

        if ciphertext.len() > keybase_types::constants::STREAM_THRESHOLD {
            let binary = if is_armored(ciphertext) {
                let text = std::str::from_utf8(ciphertext)
                    .map_err(|_| keybase_crypto::CryptoError::BadFrame)?;
                keybase_crypto::armor_decode(text)?
            } else {
                ciphertext.to_vec()
            };
            let mut out = Vec::new();
            let info =
            keybase_crypto::open_stream(&self.keyring, binary.as_slice(), &mut out).await?;
            Ok((out, info))
        } else {
            Ok(open_auto(&self.keyring, ciphertext)?)
        }
    }

    /// Releases the resolver and keyring loader. Both
    /// are owned outright, so dropping `self` already frees them; this
    /// gives callers an explicit lifecycle hook matching the façade
    /// contract.
    pub fn close(self) {
        drop(self);
    }

    pub fn recipients(&self) -> &[String] {
        &self.config.recipients
    }

    pub(crate) fn resolver(&self) -> &Resolver {
        &self.resolver
    }
}

impl Drop for Keeper {
    fn drop(&mut self) {
        self.keyring.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keybase_types::Kid;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Fixture {
        _cache_dir: tempfile::TempDir,
        _keybase_dir: tempfile::TempDir,
    }

    async fn keeper_for(
        server: &MockServer,
        recipients: &[&str],
        loaded_user: Option<&str>,
    ) -> (Keeper, Fixture) {
        let cache_dir = tempfile::tempdir().unwrap();
        let keybase_dir = tempfile::tempdir().unwrap();

        let mut config = ApiClientConfig::default();
        config.base_url = server.uri();
        let api = ApiClient::new(config);
        let cache = PublicKeyCache::open(cache_dir.path().join("cache.json")).await;
        let resolver = Resolver::new(api, cache, chrono::Duration::hours(1));

        let keyring = KeyringLoader::new(keybase_dir.path().to_path_buf());
        if let Some(username) = loaded_user {
            let secret = secret_for(username);
            let eks_dir = keybase_dir.path().join("device_eks");
            std::fs::create_dir_all(&eks_dir).unwrap();
            std::fs::write(eks_dir.join(format!("{username}.eks")), hex::encode(secret)).unwrap();
        }

        let config = Config {
            recipients: recipients.iter().map(|s| s.to_string()).collect(),
            format: keybase_types::Format::Saltpack,
            cache_ttl: std::time::Duration::from_secs(3600),
            verify_proofs: false,
        };
        (
            Keeper::with_parts(config, resolver, keyring),
            Fixture {
                _cache_dir: cache_dir,
                _keybase_dir: keybase_dir,
            },
        )
    }

    fn secret_for(username: &str) -> [u8; 32] {
        let mut seed = [0u8; 32];
        let bytes = username.as_bytes();
        for (i, b) in bytes.iter().enumerate() {
            seed[i % 32] ^= *b;
        }
        seed[31] |= 1;
        seed
    }

    fn kid_for(username: &str) -> String {
        let secret = crypto_box::SecretKey::from(secret_for(username));
        Kid::from_public_key(secret.public_key().as_bytes()).to_hex()
    }

    async fn mount_lookup(server: &MockServer, usernames: &[&str]) {
        let them: Vec<_> = usernames
            .iter()
            .map(|u| {
            json!({
                "basics": {"username": u},
                "public_keys": {"primary": {"kid": kid_for(u), "bundle": ""}}
            })
        })
            .collect();
        Mock::given(method("GET"))
            .and(path("/user/lookup.json"))
            .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": {"code": 0, "name": "OK"}, "them": them})),
        )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn single_recipient_happy_path() {
        let server = MockServer::start().await;
        mount_lookup(&server, &["alice"]).await;
        let (keeper, _fixture) = keeper_for(&server, &["alice"], Some("alice")).await;

        let cancel = CancellationToken::new();
        let ciphertext = keeper.encrypt(b"hello", &cancel).await.unwrap();
        let (plaintext, info) = keeper.decrypt_with_info(&ciphertext).await.unwrap();

        assert_eq!(plaintext, b"hello");
        assert_eq!(info.receiver_kid, kid_for("alice"));
    }

    #[tokio::test]
    async fn three_recipients_second_decrypts() {
        let server = MockServer::start().await;
        mount_lookup(&server, &["alice", "bob", "charlie"]).await;
        let (keeper, _fixture) =
        keeper_for(&server, &["alice", "bob", "charlie"], Some("bob")).await;

        let cancel = CancellationToken::new();
        let ciphertext = keeper.encrypt(b"team-secret", &cancel).await.unwrap();
        let (plaintext, info) = keeper.decrypt_with_info(&ciphertext).await.unwrap();

        assert_eq!(plaintext, b"team-secret");
        assert_eq!(info.receiver_kid, kid_for("bob"));
    }

    #[tokio::test]
    async fn empty_plaintext_is_rejected() {
        let server = MockServer::start().await;
        let (keeper, _fixture) = keeper_for(&server, &["alice"], None).await;
        let cancel = CancellationToken::new();
        let err = keeper.encrypt(b"", &cancel).await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyInput));
    }
}
