//! Upload validation.
//!
//! Checks run in a fixed order: media type, then size limit, then emptiness. The first failing
//! check decides the rejection.

use crate::constants::ALLOWED_MEDIA_TYPES;

/// Why an upload was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejection {
    #[error("uploaded file is empty")]
    Empty,

    #[error("file is {actual} bytes, limit is {limit} bytes")]
    SizeExceeded { limit: u64, actual: u64 },

    #[error("file type '{media_type}' is not allowed")]
    TypeRejected { media_type: String },
}

#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_bytes: u64,
}

impl UploadValidator {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Strips parameters and lowercases, so `Text/Plain; charset=utf-8` becomes `text/plain`.
    pub fn normalise_media_type(raw: &str) -> String {
        raw.split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }

    /// Validates an upload and returns its normalised media type.
    ///
    /// # Errors
    ///
    /// Returns the first [`UploadRejection`] that applies.
    pub fn validate(&self, declared_media_type: &str, size: u64) -> Result<String, UploadRejection> {
        let media_type = Self::normalise_media_type(declared_media_type);

        if !ALLOWED_MEDIA_TYPES.contains(&media_type.as_str()) {
            return Err(UploadRejection::TypeRejected { media_type });
        }
        if size > self.max_bytes {
            return Err(UploadRejection::SizeExceeded {
                limit: self.max_bytes,
                actual: size,
            });
        }
        if size == 0 {
            return Err(UploadRejection::Empty);
        }

        Ok(media_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_allowed_type() {
        let validator = UploadValidator::new(1024);
        for media_type in ALLOWED_MEDIA_TYPES {
            assert_eq!(validator.validate(media_type, 10).unwrap(), *media_type);
        }
    }

    #[test]
    fn normalises_parameters_and_case() {
        let validator = UploadValidator::new(1024);
        assert_eq!(
            validator.validate("Text/Plain; charset=utf-8", 3).unwrap(),
            "text/plain"
        );
    }

    #[test]
    fn rejects_unlisted_types() {
        let validator = UploadValidator::new(1024);
        let err = validator.validate("application/x-msdownload", 10).unwrap_err();
        assert_eq!(
            err,
            UploadRejection::TypeRejected {
                media_type: "application/x-msdownload".into()
            }
        );
    }

    #[test]
    fn size_limit_is_inclusive() {
        let validator = UploadValidator::new(100);
        assert!(validator.validate("application/pdf", 100).is_ok());
        assert_eq!(
            validator.validate("application/pdf", 101).unwrap_err(),
            UploadRejection::SizeExceeded {
                limit: 100,
                actual: 101
            }
        );
    }

    #[test]
    fn empty_files_are_rejected() {
        let validator = UploadValidator::new(100);
        assert_eq!(
            validator.validate("image/png", 0).unwrap_err(),
            UploadRejection::Empty
        );
    }

    #[test]
    fn type_is_checked_before_size() {
        let validator = UploadValidator::new(1);
        assert!(matches!(
            validator.validate("video/mp4", 0),
            Err(UploadRejection::TypeRejected { .. })
        ));
    }
}
