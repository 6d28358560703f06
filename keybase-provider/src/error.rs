use keybase_crypto::CryptoError;
use keybase_keyring::KeyringError;
use keybase_resolver::ResolverError;
use thiserror::Error;

use keybase_error::{ErrorKind, HasErrorKind};

/// Surface error for the Keeper facade.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("plaintext or ciphertext must not be empty")]
    EmptyInput,
    #[error(transparent)]
    Resolver(#[from] ResolverError),
    #[error(transparent)]
    Keyring(#[from] KeyringError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Canceled(#[from] keybase_error::Canceled),
}

impl HasErrorKind for ProviderError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            ProviderError::EmptyInput => ErrorKind::InvalidArgument,
            ProviderError::Resolver(e) => e.error_kind(),
            ProviderError::Keyring(e) => e.error_kind(),
            ProviderError::Crypto(e) => e.error_kind(),
            ProviderError::Canceled(_) => ErrorKind::Canceled,
        }
    }
}

impl ProviderError {
    /// Seconds the caller should wait before retrying, when known
    /// (propagated from a `ResourceExhausted` API rate limit).
    pub fn retry_after(&self) -> Option<std::time::Duration> {
        match self {
            ProviderError::Resolver(ResolverError::Api(api_err)) => api_err.retry_after(),
            _ => None,
        }
    }
}
