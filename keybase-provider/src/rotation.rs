//! Key-rotation detector.

use std::collections::HashMap;

use keybase_types::MessageInfo;
use tokio_util::sync::CancellationToken;

use crate::error::ProviderError;
use crate::keeper::Keeper;

/// Result of comparing the key that decrypted a message against the
/// recipient's currently-advertised key.
#[derive(Debug, Clone)]
pub struct RotationReport {
    pub needs_reencryption: bool,
    pub retirement_reason: Option<String>,
    pub current_username: Option<String>,
}

pub struct RotationDetector<'a> {
    keeper: &'a Keeper,
}

impl<'a> RotationDetector<'a> {
    pub fn new(keeper: &'a Keeper) -> Self {
        Self { keeper }
    }

    /// Compares the key that decrypted `info` against the current key for
    /// every recipient the Keeper is configured with.
    pub async fn check_one(
        &self,
        info: &MessageInfo,
        cancel: &CancellationToken,
    ) -> Result<RotationReport, ProviderError> {
        let recipients = self.keeper.recipients().to_vec();
        let current = self.keeper.resolver().resolve(&recipients, cancel).await?;

        for record in &current {
            if record.kid == info.receiver_kid {
                return Ok(RotationReport {
                    needs_reencryption: false,
                    retirement_reason: None,
                    current_username: Some(record.username.clone()),
                });
            }
        }

        let reason = match current.first() {
            Some(record) => format!(
                "configured recipient {} now advertises {}, message was decrypted with {}",
                record.username, record.kid, info.receiver_kid
            ),
            None => "no configured recipient currently resolves".to_string(),
        };

        Ok(RotationReport {
            needs_reencryption: true,
            retirement_reason: Some(reason),
            current_username: current.first().map(|r| r.username.clone()),
        })
    }
}

/// Decrypt → detect → (if needed) re-encrypt with current keys.
pub async fn perform_lazy_reencryption(
    keeper: &Keeper,
    old_ciphertext: &[u8],
    cancel: &CancellationToken,
) -> Result<(Vec<u8>, Option<Vec<u8>>), ProviderError> {
    let (plaintext, info) = keeper.decrypt_with_info(old_ciphertext).await?;
    let report = RotationDetector::new(keeper).check_one(&info, cancel).await?;

    if report.needs_reencryption {
        let new_ciphertext = keeper.encrypt(&plaintext, cancel).await?;
        Ok((plaintext, Some(new_ciphertext)))
    } else {
        Ok((plaintext, None))
    }
}

/// Per-item outcome of a batch migration.
#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    pub plaintext: Option<Vec<u8>>,
    pub new_ciphertext: Option<Vec<u8>>,
    pub rotation_detected: bool,
    pub error: Option<String>,
}

/// Applies [`perform_lazy_reencryption`] to a batch, never aborting on a
/// single item's failure.
pub async fn migrate_encrypted_data(
    keeper: &Keeper,
    items: HashMap<String, Vec<u8>>,
    cancel: &CancellationToken,
) -> HashMap<String, MigrationOutcome> {
    let mut results = HashMap::with_capacity(items.len());
    for (id, ciphertext) in items {
        let outcome = match perform_lazy_reencryption(keeper, &ciphertext, cancel).await {
            Ok((plaintext, new_ciphertext)) => MigrationOutcome {
                rotation_detected: new_ciphertext.is_some(),
                plaintext: Some(plaintext),
                new_ciphertext,
                error: None,
            },
            Err(e) => MigrationOutcome {
                plaintext: None,
                new_ciphertext: None,
                rotation_detected: false,
                error: Some(e.to_string()),
            },
        };
        results.insert(id, outcome);
    }
    results
}
