//! Shared data model for the Keybase secrets-provider crates.
//!
//! Provider URL parsing, the resolver/keyring record types, and the
//! key-identifier codec all live here so `keybase-api`, `keybase-cache`,
//! `keybase-resolver`, `keybase-keyring`, `keybase-crypto`, and
//! `keybase-provider` can share one definition of each without a cyclic
//! dependency.

pub mod config;
pub mod constants;
pub mod kid;
pub mod message;
pub mod records;

pub use config::{Config, ConfigError, Format};
pub use constants::{ARMOR_BEGIN, ARMOR_END, DEFAULT_CACHE_TTL_SECS, DEFAULT_KEYRING_TTL_SECS, STREAM_THRESHOLD};
pub use kid::{Kid, KidError};
pub use message::MessageInfo;
pub use records::{PublicKeyRecord, SecretKeyRecord};
