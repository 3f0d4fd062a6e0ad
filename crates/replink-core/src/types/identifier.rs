use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

///
/// Identifier
/// Opaque handle for one linked entity.
///
/// Carries the canonical text form of the source primary key. Equality,
/// ordering, and hashing are structural over that text; batch tie-breaks
/// use the 64-bit key hash instead so apply order is independent of key
/// naming schemes.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Stable 64-bit hash of the canonical text.
    #[must_use]
    pub fn key_hash(&self) -> u64 {
        xxh3_64(self.0.as_bytes())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Identifier {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}
