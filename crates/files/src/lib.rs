//! Survey Report Attachments
//!
//! This crate validates uploaded files and stores them for the survey report service.
//!
//! ## Design Principles
//!
//! - Report records and attachment bytes are kept apart; the report never embeds file content
//! - Files are immutable once added (new content creates a new file)
//! - Storage is scoped per report; there is no global binary namespace
//! - Uploading an attachment never changes the report it belongs to
//!
//! ## Report-Scoped Storage Model
//!
//! ```text
//! <upload_root>/
//! └── <report_id>/
//!     └── files/
//!         └── sha256/
//!             └── ab/
//!                 └── cd/
//!                     └── abcd3f9e…
//! ```
//!
//! Metadata lives in memory alongside the report store and is listed per report.
//!
//! ## Example Usage
//!
//! ```no_run
//! use survey_files::{AttachmentStore, NewAttachment, UploadValidator};
//! use survey_uuid::RecordId;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = AttachmentStore::new(Path::new("uploads"), UploadValidator::new(10 * 1024 * 1024))?;
//! let metadata = store.add(NewAttachment {
//!     report_id: RecordId::new(),
//!     uploaded_by: RecordId::new(),
//!     original_filename: Some("plan.pdf"),
//!     declared_media_type: "application/pdf",
//!     bytes: b"%PDF-1.7",
//! })?;
//! println!("stored {}", metadata.hash);
//! # Ok(())
//! # }
//! ```

mod constants;
mod files;
mod upload;

pub use constants::{ALLOWED_MEDIA_TYPES, FILES_FOLDER_NAME};
pub use files::{AttachmentMetadata, AttachmentStore, NewAttachment};
pub use upload::{UploadRejection, UploadValidator};

/// Errors that can occur during attachment operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Upload root exists but is not a directory, or cannot be created
    #[error("Invalid upload directory: {0}")]
    InvalidRootDirectory(String),

    /// Upload failed validation
    #[error(transparent)]
    Rejected(#[from] UploadRejection),

    /// Identical content already stored for this report (immutability violation)
    #[error("File with hash {0} already exists for this report")]
    FileAlreadyExists(String),

    /// No attachment with this id for the report
    #[error("Attachment not found: {0}")]
    NotFound(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Digest could not be represented as a hash value
    #[error("Invalid digest: {0}")]
    Digest(#[from] survey_uuid::UuidError),

    /// Filename could not be represented as text
    #[error("Invalid filename: {0}")]
    Filename(#[from] survey_types::TypesError),
}
