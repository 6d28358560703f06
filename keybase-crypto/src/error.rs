use keybase_error::{ErrorKind, HasErrorKind};
use thiserror::Error;

/// Crypto engine error kinds.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("ciphertext is malformed or truncated")]
    BadCiphertext,
    #[error("authentication tag did not verify (wrong key or tampered data)")]
    BadTag,
    #[error("armor framing is missing or malformed")]
    BadFrame,
    #[error("unexpected message type")]
    WrongMessageType,
    #[error("unsupported message version")]
    BadVersion,
    #[error("no loaded secret key matches any recipient in this message")]
    NoMatchingKey,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HasErrorKind for CryptoError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            CryptoError::BadCiphertext
            | CryptoError::BadTag
            | CryptoError::BadFrame
            | CryptoError::WrongMessageType
            | CryptoError::BadVersion => ErrorKind::InvalidArgument,
            CryptoError::NoMatchingKey => ErrorKind::NotFound,
            CryptoError::Io(_) => ErrorKind::Internal,
        }
    }
}
