//! Session identifier type.

use std::fmt;
use std::str::FromStr;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Number of random bytes behind a generated id (128 bits).
const ID_BYTES: usize = 16;

/// Longest identifier accepted from a client.
const MAX_ID_LEN: usize = 256;

/// Opaque identifier of a visitor session.
///
/// Generated ids are 32 lowercase hex characters drawn from the operating
/// system RNG. Ids presented by clients are accepted when they consist of
/// 1 to 256 characters from `[A-Za-z0-9,-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Generate a new random session ID.
    pub fn generate() -> Self {
        let mut bytes = [0u8; ID_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether a string is acceptable as a session id.
    pub fn is_valid(candidate: &str) -> bool {
        !candidate.is_empty()
            && candidate.len() <= MAX_ID_LEN
            && candidate
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b',' || b == b'-')
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::is_valid(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(SessionError::InvalidId(s.to_string()))
        }
    }
}

impl TryFrom<String> for SessionId {
    type Error = SessionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if Self::is_valid(&value) {
            Ok(Self(value))
        } else {
            Err(SessionError::InvalidId(value))
        }
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_uniqueness() {
        let mut ids = HashSet::new();
        for _ in 0..10_000 {
            let id = SessionId::generate();
            assert!(ids.insert(id.clone()), "Duplicate ID generated: {}", id);
        }
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_generated_format() {
        let id = SessionId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
        assert!(SessionId::is_valid(id.as_str()));
    }

    #[test]
    fn test_parse_valid() {
        let id: SessionId = "abc123,DEF-456".parse().unwrap();
        assert_eq!(id.as_str(), "abc123,DEF-456");
    }

    #[test]
    fn test_parse_invalid() {
        // Empty
        assert!("".parse::<SessionId>().is_err());

        // Path traversal
        assert!("../etc/passwd".parse::<SessionId>().is_err());

        // Whitespace
        assert!("abc def".parse::<SessionId>().is_err());

        // Too long
        assert!("a".repeat(257).parse::<SessionId>().is_err());
        assert!("a".repeat(256).parse::<SessionId>().is_ok());
    }

    #[test]
    fn test_roundtrip() {
        let original = SessionId::generate();
        let parsed: SessionId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_serde_rejects_invalid() {
        let ok: SessionId = serde_json::from_str("\"abcd\"").unwrap();
        assert_eq!(ok.as_str(), "abcd");
        assert!(serde_json::from_str::<SessionId>("\"a b\"").is_err());
    }
}
