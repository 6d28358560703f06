//! Keeper facade and key-rotation detector.
//!
//! Wires the resolver, keyring loader, and crypto engine together behind
//! the public Encrypt/Decrypt/Close contract, and layers rotation
//! detection on top of `DecryptWithInfo`.

mod error;
mod keeper;
mod rotation;

pub use error::ProviderError;
pub use keeper::Keeper;
pub use rotation::{
    migrate_encrypted_data, perform_lazy_reencryption, MigrationOutcome, RotationDetector,
    RotationReport,
};
