//! On-disk JSON shape of the public-key cache file.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use keybase_types::{Kid, PublicKeyRecord};
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CacheFile {
    pub entries: HashMap<String, CacheFileEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CacheFileEntry {
    pub username: String,
    /// The PGP-bundle field from the API response — stored, never parsed.
    #[serde(default)]
    pub public_key: String,
    pub key_id: String,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<&PublicKeyRecord> for CacheFileEntry {
    fn from(r: &PublicKeyRecord) -> Self {
        CacheFileEntry {
            username: r.username.clone(),
            public_key: r.pgp_bundle.clone(),
            key_id: r.kid.clone(),
            fetched_at: r.fetched_at,
            expires_at: r.expires_at,
        }
    }
}

impl TryFrom<&CacheFileEntry> for PublicKeyRecord {
    type Error = CacheError;

    fn try_from(e: &CacheFileEntry) -> Result<Self, Self::Error> {
        let kid = Kid::from_hex(&e.key_id)?;
        Ok(PublicKeyRecord {
            username: e.username.clone(),
            kid: e.key_id.clone(),
            public_key_material: kid.public_key(),
            pgp_bundle: e.public_key.clone(),
            fetched_at: e.fetched_at,
            expires_at: e.expires_at,
        })
    }
}
