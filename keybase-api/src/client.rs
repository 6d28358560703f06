//! `BatchLookup` — the API client's one operation.
//!
//! Implements the `Idle -> Sending -> (OK | Backing-off | Error)` state
//! machine as a plain retry loop: each iteration is one
//! `Sending` state, a retriable failure transitions into a `Backing-off`
//! sleep (or straight back to `Sending` once the delay elapses), and a
//! non-retriable failure or exhausted attempt budget transitions to
//! `Error`. Cancellation races the in-flight request and the backoff sleep
//! the same way `privstack_cloud`'s credential refresh races its HTTP call.

use chrono::{DateTime, Utc};
use keybase_error::Canceled;
use keybase_types::PublicKeyRecord;
use reqwest::{Client, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ApiClientConfig;
use crate::error::ApiError;
use crate::response::LookupResponse;

/// HTTP client for the Keybase `user/lookup.json` endpoint.
pub struct ApiClient {
    http: Client,
    config: ApiClientConfig,
}

impl ApiClient {
    pub fn new(config: ApiClientConfig) -> Self {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to build HTTP client");
        Self { http, config }
    }

    pub fn from_env() -> Self {
        Self::new(ApiClientConfig::from_env())
    }

    /// Looks up public keys for every username in `usernames` in a single
    /// batched request, retrying on transient failure.
    ///
    /// `ttl` is applied to every returned record's `expires_at`; the client
    /// itself holds no cache state.
    pub async fn batch_lookup(
        &self,
        usernames: &[String],
        ttl: chrono::Duration,
        cancel: &CancellationToken,
    ) -> Result<Vec<PublicKeyRecord>, ApiError> {
        if usernames.is_empty() {
            return Ok(Vec::new());
        }

        let mut attempt: u32 = 1;
        loop {
            if cancel.is_cancelled() {
                return Err(ApiError::Canceled(Canceled));
            }

            match self.send_once(usernames, ttl, cancel).await {
                Ok(records) => return Ok(records),
                Err(err) if !err.is_retriable() || attempt > self.config.max_retries => {
                    return Err(err);
                }
                Err(err) => {
                    let delay = err
                        .retry_after()
                        .unwrap_or_else(|| self.config.base_retry_delay * 2u32.pow(attempt - 1));
                    warn!(attempt, ?delay, "keybase lookup failed, retrying: {err}");

                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancel.cancelled() => return Err(ApiError::Canceled(Canceled)),
                    }
                    attempt += 1;
                }
            }
        }
    }

    async fn send_once(
        &self,
        usernames: &[String],
        ttl: chrono::Duration,
        cancel: &CancellationToken,
    ) -> Result<Vec<PublicKeyRecord>, ApiError> {
        let csv = usernames.join(",");
        let url = format!("{}/user/lookup.json", self.config.base_url);

        let resp = tokio::select! {
            r = self
                .http
                .get(&url)
                .query(&[("usernames", csv.as_str()), ("fields", "public_keys")])
                .header("User-Agent", &self.config.user_agent)
                .send() => r?,
            _ = cancel.cancelled() => return Err(ApiError::Canceled(Canceled)),
        };

        let status = resp.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = parse_retry_after(resp.headers());
            return Err(ApiError::RateLimit { retry_after });
        }
        if status.is_server_error() {
            return Err(ApiError::ServerError(format!("HTTP {status}")));
        }
        if status.is_client_error() {
            return Err(ApiError::InvalidInput(format!("HTTP {status}")));
        }

        let body: LookupResponse = resp
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        if body.status.code != 0 {
            return Err(ApiError::InvalidResponse(format!(
                "status {} {}",
                body.status.code, body.status.name
            )));
        }

        if body.them.len() != usernames.len() {
            return Err(ApiError::InvalidResponse(format!(
                "expected {} entries, got {}",
                usernames.len(),
                body.them.len()
            )));
        }

        let fetched_at = Utc::now();
        let mut records = Vec::with_capacity(usernames.len());
        for (username, entry) in usernames.iter().zip(body.them.into_iter()) {
            let entry = entry.ok_or_else(|| ApiError::NotFound(username.clone()))?;
            let primary = entry
                .public_keys
                .primary
                .ok_or_else(|| ApiError::NotFound(username.clone()))?;

            let kid = keybase_types::Kid::from_hex(&primary.kid)
                .map_err(|e| ApiError::InvalidResponse(format!("bad KID for {username}: {e}")))?;

            debug!(username, "resolved keybase public key");
            records.push(PublicKeyRecord::new(
                username.clone(),
                kid.public_key(),
                primary.bundle,
                fetched_at,
                ttl,
            ));
        }

        Ok(records)
    }
}

/// Parses `Retry-After`, which may be an integer number of seconds or an
/// HTTP-date. Unparseable headers fall back to no override,
/// letting the caller use exponential backoff instead.
fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> std::time::Duration {
    let Some(raw) = headers.get(reqwest::header::RETRY_AFTER).and_then(|v| v.to_str().ok())
    else {
        return std::time::Duration::from_secs(1);
    };

    if let Ok(secs) = raw.trim().parse::<u64>() {
        return std::time::Duration::from_secs(secs);
    }

    if let Ok(date) = DateTime::parse_from_rfc2822(raw.trim()) {
        let delta = date.with_timezone(&Utc) - Utc::now();
        if let Ok(std_delta) = delta.to_std() {
            return std_delta;
        }
    }

    std::time::Duration::from_secs(1)
}
