use keybase_error::{ErrorKind, HasErrorKind};
use thiserror::Error;

/// Local keyring errors.
#[derive(Debug, Error)]
pub enum KeyringError {
    #[error("keybase configuration directory is not available")]
    KeybaseUnavailable,
    #[error("no logged-in keybase user could be determined")]
    NotLoggedIn,
    #[error("secret key file for {username} was not found")]
    KeyFileMissing { username: String },
    #[error("secret key for {username} failed validation: {reason}")]
    InvalidKey { username: String, reason: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HasErrorKind for KeyringError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            KeyringError::KeybaseUnavailable => ErrorKind::Internal,
            KeyringError::NotLoggedIn => ErrorKind::InvalidArgument,
            KeyringError::KeyFileMissing { .. } => ErrorKind::NotFound,
            KeyringError::InvalidKey { .. } => ErrorKind::InvalidArgument,
            KeyringError::Io(_) => ErrorKind::Internal,
        }
    }
}
