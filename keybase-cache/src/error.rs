use keybase_error::{ErrorKind, HasErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache file is corrupted: {0}")]
    Corrupted(#[from] serde_json::Error),
    #[error("invalid KID in cache entry: {0}")]
    InvalidKid(#[from] keybase_types::KidError),
}

impl HasErrorKind for CacheError {
    fn error_kind(&self) -> ErrorKind {
        ErrorKind::Internal
    }
}
