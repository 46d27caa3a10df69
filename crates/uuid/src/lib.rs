//! Identifier utilities.
//!
//! Every record the survey service stores (reports, deficiencies, users, attachments) is keyed by
//! a *canonical* UUID: **32 lowercase hexadecimal characters** (no hyphens), the same value
//! `Uuid::new_v4().simple().to_string()` produces.
//!
//! This crate provides:
//! - [`RecordId`], a wrapper that guarantees the canonical form once constructed.
//! - [`Sha256Hash`], a validated hex digest used to address uploaded attachment content.
//!
//! Externally supplied identifiers (path segments, token subjects) must already be canonical.
//! Uppercase, hyphenated, wrong-length or non-hex inputs are rejected.

mod hash;
mod id;

pub use hash::Sha256Hash;
pub use id::{RecordId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
