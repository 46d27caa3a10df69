use crate::{UuidError, UuidResult};
use std::fmt;

/// Hex-encoded SHA-256 digest (64 lowercase hex characters).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sha256Hash(String);

impl Sha256Hash {
    /// Validates a hex digest.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] unless `input` is 64 lowercase hex characters.
    pub fn parse(input: &str) -> UuidResult<Self> {
        let ok = input.len() == 64
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if ok {
            Ok(Self(input.to_owned()))
        } else {
            Err(UuidError::InvalidInput(format!(
                "sha256 digest must be 64 lowercase hex characters, got {} characters",
                input.len()
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Sha256Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Sha256Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Sha256Hash::parse(&s).map_err(serde::de::Error::custom)
    }
}
