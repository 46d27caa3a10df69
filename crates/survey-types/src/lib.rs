//! Validated primitive wrappers shared by the survey crates.
//!
//! Values of these types are checked once, at construction, so the rest of the system can hold
//! them without re-validating.

/// Errors that can occur when constructing validated primitives.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TypesError {
    /// The input text was empty or contained only whitespace
    #[error("text cannot be empty")]
    Empty,
    /// A compliance score fell outside `0..=100`
    #[error("compliance score must be between 0 and 100, got {0}")]
    ScoreOutOfRange(i64),
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction. Facility
/// identifiers, surveyor names, scope areas, standard codes and notes all use this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText`, trimming the input.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::Empty`] if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TypesError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TypesError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A survey compliance score, guaranteed to lie in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ComplianceScore(u8);

impl ComplianceScore {
    pub const MAX: u8 = 100;

    /// Validates a raw score.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::ScoreOutOfRange`] for values below 0 or above 100.
    pub fn new(value: i64) -> Result<Self, TypesError> {
        if (0..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(TypesError::ScoreOutOfRange(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for ComplianceScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for ComplianceScore {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for ComplianceScore {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        ComplianceScore::new(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Dr. Alvarez ").unwrap();
        assert_eq!(text.as_str(), "Dr. Alvarez");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        assert_eq!(NonEmptyText::new("   \t"), Err(TypesError::Empty));
        assert_eq!(NonEmptyText::new(""), Err(TypesError::Empty));
    }

    #[test]
    fn non_empty_text_deserialize_rejects_empty() {
        let result: Result<NonEmptyText, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());
    }

    #[test]
    fn compliance_score_bounds() {
        assert_eq!(ComplianceScore::new(0).unwrap().value(), 0);
        assert_eq!(ComplianceScore::new(100).unwrap().value(), 100);
        assert_eq!(
            ComplianceScore::new(101),
            Err(TypesError::ScoreOutOfRange(101))
        );
        assert_eq!(
            ComplianceScore::new(-1),
            Err(TypesError::ScoreOutOfRange(-1))
        );
    }

    #[test]
    fn compliance_score_serialises_as_number() {
        let json = serde_json::to_string(&ComplianceScore::new(87).unwrap()).unwrap();
        assert_eq!(json, "87");
        let back: Result<ComplianceScore, _> = serde_json::from_str("150");
        assert!(back.is_err());
    }
}
