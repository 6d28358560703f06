use keybase_api::ApiError;
use keybase_cache::CacheError;
use keybase_error::{ErrorKind, HasErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("user not found: {0}")]
    NotFound(String),
}

impl HasErrorKind for ResolverError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            ResolverError::Api(e) => e.error_kind(),
            ResolverError::Cache(e) => e.error_kind(),
            ResolverError::NotFound(_) => ErrorKind::NotFound,
        }
    }
}
