//! Persistent on-disk public-key cache.

mod cache;
mod error;
mod file_format;
mod path;

pub use cache::{CacheStats, PublicKeyCache};
pub use error::CacheError;
pub use path::default_cache_path;
