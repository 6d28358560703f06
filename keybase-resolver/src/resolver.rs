//! Cache + API fusion.

use std::collections::HashMap;

use chrono::Duration;
use keybase_api::ApiClient;
use keybase_cache::PublicKeyCache;
use keybase_types::PublicKeyRecord;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::ResolverError;

/// Resolves recipient usernames to public keys, consulting the cache
/// before the network and writing fetched keys back.
pub struct Resolver {
    api: ApiClient,
    cache: PublicKeyCache,
    ttl: Duration,
}

impl Resolver {
    pub fn new(api: ApiClient, cache: PublicKeyCache, ttl: Duration) -> Self {
        Self { api, cache, ttl }
    }

    /// Resolves every username in `usernames`, preserving input order
    /// regardless of which entries came from cache vs. the network.
    pub async fn resolve(
        &self,
        usernames: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<PublicKeyRecord>, ResolverError> {
        let mut slots: Vec<Option<PublicKeyRecord>> = Vec::with_capacity(usernames.len());
        let mut missing: Vec<String> = Vec::new();

        for u in usernames {
            let cached = self.cache.get(u).await;
            if cached.is_none() {
                missing.push(u.clone());
            }
            slots.push(cached);
        }

        // Offline path: every recipient already has a non-expired cache
        // entry, so no network call is made at all.
        if !missing.is_empty() {
            let fetched = self.api.batch_lookup(&missing, self.ttl, cancel).await?;

            for record in &fetched {
                if let Err(e) = self.cache.set(record.clone()).await {
                    // A cache-write failure is not a failure to fetch.
                    warn!("failed to cache public key for {}: {e}", record.username);
                }
            }

            let by_username: HashMap<&str, &PublicKeyRecord> =
            fetched.iter().map(|r| (r.username.as_str(), r)).collect();

            for (slot, username) in slots.iter_mut().zip(usernames.iter()) {
                if slot.is_none() {
                    *slot = by_username.get(username.as_str()).map(|r| (*r).clone());
                }
            }
        }

        let mut out = Vec::with_capacity(slots.len());
        for (slot, username) in slots.into_iter().zip(usernames.iter()) {
            match slot {
                Some(record) => out.push(record),
                None => return Err(ResolverError::NotFound(username.clone())),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keybase_api::ApiClientConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn resolver_with_server(server: &MockServer) -> (Resolver, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let cache = PublicKeyCache::open(dir.path().join("cache.json")).await;
        let mut config = ApiClientConfig::default();
        config.base_url = server.uri();
        let api = ApiClient::new(config);
        (Resolver::new(api, cache, Duration::hours(1)), dir)
    }

    fn ok_body(usernames: &[&str]) -> serde_json::Value {
        json!({
            "status": {"code": 0, "name": "OK"},
            "them": usernames.iter().map(|u| json!({
                "basics": {"username": u},
                "public_keys": {"primary": {
                    "kid": format!("0120{}", "ab".repeat(32)),
                    "bundle": "",
                }}
            })).collect::<Vec<_>>(),
        })
    }

    #[tokio::test]
    async fn resolves_and_preserves_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/lookup.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(&["bob", "alice"])))
            .mount(&server)
            .await;

        let (resolver, _dir) = resolver_with_server(&server).await;
        let cancel = CancellationToken::new();
        let names = vec!["bob".to_string(), "alice".to_string()];
        let records = resolver.resolve(&names, &cancel).await.unwrap();
        assert_eq!(records[0].username, "bob");
        assert_eq!(records[1].username, "alice");
    }

    #[tokio::test]
    async fn second_resolve_hits_cache_not_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/lookup.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(&["alice"])))
            .expect(1)
            .mount(&server)
            .await;

        let (resolver, _dir) = resolver_with_server(&server).await;
        let cancel = CancellationToken::new();
        let names = vec!["alice".to_string()];
        let first = resolver.resolve(&names, &cancel).await.unwrap();
        let second = resolver.resolve(&names, &cancel).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn missing_user_surfaces_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/lookup.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": {"code": 0, "name": "OK"},
            "them": [serde_json::Value::Null],
        })))
            .mount(&server)
            .await;

        let (resolver, _dir) = resolver_with_server(&server).await;
        let cancel = CancellationToken::new();
        let names = vec!["ghost".to_string()];
        let err = resolver.resolve(&names, &cancel).await.unwrap_err();
        assert!(matches!(err, ResolverError::NotFound(_)));
    }
}
