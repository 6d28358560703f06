use std::time::Duration;

use keybase_error::{ErrorKind, HasErrorKind};
use thiserror::Error;

/// Error kinds produced by the Keybase lookup API client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimit { retry_after: Duration },
    #[error("user not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("server error: {0}")]
    ServerError(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error(transparent)]
    Canceled(#[from] keybase_error::Canceled),
}

impl ApiError {
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ApiError::RateLimit { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    /// True when a retry attempt is worth making.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_) | ApiError::Timeout | ApiError::RateLimit { .. } | ApiError::ServerError(_)
        )
    }
}

impl HasErrorKind for ApiError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            ApiError::Network(_) | ApiError::ServerError(_) | ApiError::InvalidResponse(_) => {
                ErrorKind::Internal
            }
            ApiError::Timeout => ErrorKind::DeadlineExceeded,
            ApiError::RateLimit { .. } => ErrorKind::ResourceExhausted,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::InvalidInput(_) => ErrorKind::InvalidArgument,
            ApiError::Canceled(_) => ErrorKind::Canceled,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(e.to_string())
        }
    }
}
