//! Provider URL / config parsing.
//!
//! ```text
//! keybase://u1,u2,…[?format=saltpack|pgp][&cache_ttl=<seconds>][&verify_proofs=true|false]
//! ```

use std::fmt;
use std::time::Duration;

use keybase_error::{ErrorKind, HasErrorKind};
use thiserror::Error;

use crate::constants::DEFAULT_CACHE_TTL_SECS;

const SCHEME: &str = "keybase";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("provider URL must not be empty")]
    Empty,
    #[error("unsupported scheme {0:?}, expected \"keybase\"")]
    UnsupportedScheme(String),
    #[error("recipient list must not be empty")]
    EmptyRecipients,
    #[error("invalid recipient username {0:?}: must match [A-Za-z0-9_]+")]
    InvalidUsername(String),
    #[error("unsupported format {0:?}, expected \"saltpack\" or \"pgp\"")]
    InvalidFormat(String),
    #[error("invalid cache_ttl {0:?}: must be a non-negative integer number of seconds")]
    InvalidCacheTtl(String),
    #[error("invalid verify_proofs {0:?}: must be \"true\" or \"false\"")]
    InvalidVerifyProofs(String),
}

impl HasErrorKind for ConfigError {
    fn error_kind(&self) -> ErrorKind {
        ErrorKind::InvalidArgument
    }
}

/// Ciphertext wire format. Only `Saltpack` is functional in this core;
/// `Pgp` is accepted and stored but never used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Saltpack,
    Pgp,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Saltpack => "saltpack",
            Format::Pgp => "pgp",
        })
    }
}

impl std::str::FromStr for Format {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "saltpack" => Ok(Format::Saltpack),
            "pgp" => Ok(Format::Pgp),
            _ => Err(ConfigError::InvalidFormat(s.to_string())),
        }
    }
}

/// Parsed and validated provider configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub recipients: Vec<String>,
    pub format: Format,
    pub cache_ttl: Duration,
    pub verify_proofs: bool,
}

fn validate_username(u: &str) -> Result<(), ConfigError> {
    if !u.is_empty() && u.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(ConfigError::InvalidUsername(u.to_string()))
    }
}

impl Config {
    /// Parses a `keybase://` provider URL.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        if s.is_empty() {
            return Err(ConfigError::Empty);
        }

        let (scheme, rest) = s.split_once("://").ok_or(ConfigError::Empty)?;
        if scheme != SCHEME {
            return Err(ConfigError::UnsupportedScheme(scheme.to_string()));
        }

        let (recipients_part, query_part) = match rest.split_once('?') {
            Some((a, b)) => (a, Some(b)),
            None => (rest, None),
        };

        if recipients_part.is_empty() {
            return Err(ConfigError::EmptyRecipients);
        }

        let recipients: Vec<String> = recipients_part.split(',').map(str::to_string).collect();
        for u in &recipients {
            validate_username(u)?;
        }

        let mut format = Format::default();
        let mut cache_ttl = Duration::from_secs(DEFAULT_CACHE_TTL_SECS);
        let mut verify_proofs = false;

        if let Some(query) = query_part {
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                match key {
                    "format" => format = value.parse()?,
                    "cache_ttl" => {
                        let secs: i64 = value
                            .parse()
                            .map_err(|_| ConfigError::InvalidCacheTtl(value.to_string()))?;
                        if secs < 0 {
                            return Err(ConfigError::InvalidCacheTtl(value.to_string()));
                        }
                        cache_ttl = Duration::from_secs(secs as u64);
                    }
                    "verify_proofs" => {
                        verify_proofs = match value {
                            "true" => true,
                            "false" => false,
                            _ => return Err(ConfigError::InvalidVerifyProofs(value.to_string())),
                        };
                    }
                    _ => {} // unrecognized options are ignored, not rejected
                }
            }
        }

        Ok(Config {
            recipients,
            format,
            cache_ttl,
            verify_proofs,
        })
    }

    /// Serializes back to a provider URL. `parse(c.to_url()) == c` for every
    /// `Config` produced by `parse`.
    pub fn to_url(&self) -> String {
        format!(
            "{SCHEME}://{}?format={}&cache_ttl={}&verify_proofs={}",
            self.recipients.join(","),
            self.format,
            self.cache_ttl.as_secs(),
            self.verify_proofs,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prop_assert_eq;

    #[test]
    fn parses_minimal_url() {
        let cfg = Config::parse("keybase://alice").unwrap();
        assert_eq!(cfg.recipients, vec!["alice"]);
        assert_eq!(cfg.format, Format::Saltpack);
        assert_eq!(cfg.cache_ttl, Duration::from_secs(DEFAULT_CACHE_TTL_SECS));
        assert!(!cfg.verify_proofs);
    }

    #[test]
    fn parses_full_url() {
        let cfg =
        Config::parse("keybase://alice,bob?format=pgp&cache_ttl=60&verify_proofs=true")
            .unwrap();
        assert_eq!(cfg.recipients, vec!["alice", "bob"]);
        assert_eq!(cfg.format, Format::Pgp);
        assert_eq!(cfg.cache_ttl, Duration::from_secs(60));
        assert!(cfg.verify_proofs);
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(Config::parse(""), Err(ConfigError::Empty)));
    }

    #[test]
    fn rejects_wrong_scheme() {
        assert!(matches!(
            Config::parse("s3://alice"),
            Err(ConfigError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn rejects_empty_recipients() {
        assert!(matches!(
            Config::parse("keybase://"),
            Err(ConfigError::EmptyRecipients)
        ));
    }

    #[test]
    fn rejects_invalid_username() {
        assert!(matches!(
            Config::parse("keybase://al!ce"),
            Err(ConfigError::InvalidUsername(_))
        ));
    }

    #[test]
    fn rejects_invalid_format() {
        assert!(matches!(
            Config::parse("keybase://alice?format=pem"),
            Err(ConfigError::InvalidFormat(_))
        ));
    }

    #[test]
    fn rejects_negative_cache_ttl() {
        assert!(matches!(
            Config::parse("keybase://alice?cache_ttl=-1"),
            Err(ConfigError::InvalidCacheTtl(_))
        ));
    }

    #[test]
    fn rejects_non_boolean_verify_proofs() {
        assert!(matches!(
            Config::parse("keybase://alice?verify_proofs=yes"),
            Err(ConfigError::InvalidVerifyProofs(_))
        ));
    }

    #[test]
    fn duplicate_recipients_are_preserved() {
        let cfg = Config::parse("keybase://alice,alice").unwrap();
        assert_eq!(cfg.recipients, vec!["alice", "alice"]);
    }

    #[test]
    fn round_trips() {
        for s in [
            "keybase://alice",
            "keybase://alice,bob,charlie?format=pgp&cache_ttl=0&verify_proofs=true",
        ] {
            let once = Config::parse(s).unwrap();
            let twice = Config::parse(&once.to_url()).unwrap();
            assert_eq!(once, twice);
        }
    }

    proptest::proptest! {
        #[test]
        fn round_trip_prop(
            names in proptest::collection::vec("[A-Za-z0-9_]{1,12}", 1..5),
            ttl in 0u64..1_000_000,
            verify in proptest::bool::ANY,
            pgp in proptest::bool::ANY,
        ) {
            let format = if pgp { "pgp" } else { "saltpack" };
            let url = format!(
                "keybase://{}?format={}&cache_ttl={}&verify_proofs={}",
                names.join(","), format, ttl, verify
            );
            let once = Config::parse(&url).unwrap();
            let twice = Config::parse(&once.to_url()).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
