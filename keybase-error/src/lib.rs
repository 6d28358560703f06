//! Shared error taxonomy for the Keybase secrets provider.
//!
//! Every subsystem (API client, cache, keyring, crypto engine) defines its
//! own `thiserror` enum for its own failure modes, the same way
//! `privstack_cloud::CloudError` wraps `privstack_crypto::CryptoError`
//! rather than flattening everything into one type. This crate supplies the
//! pieces that are genuinely shared: the stable surface taxonomy
//! (`ErrorKind`), the marker error for an aborted operation, and the
//! `source()`-chain downcasting helper every layer re-exports as `error_as`.

use std::error::Error as StdError;
use std::fmt;

/// Stable error taxonomy surfaced by the Keeper façade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    ResourceExhausted,
    DeadlineExceeded,
    Canceled,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::NotFound => "not_found",
            ErrorKind::ResourceExhausted => "resource_exhausted",
            ErrorKind::DeadlineExceeded => "deadline_exceeded",
            ErrorKind::Canceled => "canceled",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Implemented by every per-crate error enum so the façade can map to an
/// `ErrorKind` without matching on each subsystem's variants directly.
pub trait HasErrorKind {
    fn error_kind(&self) -> ErrorKind;
}

/// Raised when a caller's `CancellationToken` fires while an operation is
/// in flight (a pending retry sleep, an HTTP request, a stream copy).
#[derive(Debug, Clone, Copy, Default)]
pub struct Canceled;

impl fmt::Display for Canceled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("operation canceled")
    }
}

impl StdError for Canceled {}

/// Walks the `source()` chain of `err` looking for a `T`.
///
/// This is the `ErrorAs`-style unwrapping mechanism: callers can recover
/// the original Saltpack/HTTP/IO error underneath
/// several layers of `thiserror` wrapping without the façade needing to
/// know about every concrete error type up front.
pub fn error_as<'a, T: StdError + 'static>(err: &'a (dyn StdError + 'static)) -> Option<&'a T> {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = cur {
        if let Some(t) = e.downcast_ref::<T>() {
            return Some(t);
        }
        cur = e.source();
    }
    None
}
