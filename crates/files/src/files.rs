//! Report-scoped attachment storage
//!
//! [`AttachmentStore`] writes validated uploads to content-addressed paths below a single upload
//! root and keeps their metadata in an in-memory index keyed by report.
//!
//! # Content Addressing
//!
//! Files are stored using their SHA-256 hash as the filename. This provides:
//!
//! - **Integrity**: File content can be verified against its hash
//! - **Immutability**: Files cannot be modified after creation
//! - **Deterministic paths**: Same content always produces the same path
//!
//! The same bytes may be attached to different reports; attaching them twice to one report is
//! refused.

use crate::constants::{DEFAULT_FILENAME, FILES_FOLDER_NAME, HASH_ALGORITHM};
use crate::upload::UploadValidator;
use crate::FilesError;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use survey_types::NonEmptyText;
use survey_uuid::{RecordId, Sha256Hash};
use utoipa::ToSchema;

/// Metadata for a stored attachment
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentMetadata {
    #[schema(value_type = String)]
    pub id: RecordId,

    #[schema(value_type = String)]
    pub report_id: RecordId,

    /// Client-supplied filename with any directory components removed
    #[schema(value_type = String)]
    pub original_filename: NonEmptyText,

    /// Media type from the upload, normalised
    pub declared_media_type: String,

    /// Media type sniffed from the content, if recognised
    ///
    /// Best-effort and informational only; acceptance is decided on the declared type.
    pub detected_media_type: Option<String>,

    pub size_bytes: u64,

    /// Hexadecimal SHA-256 digest of the content
    #[schema(value_type = String)]
    pub hash: Sha256Hash,

    #[schema(value_type = String)]
    pub uploaded_by: RecordId,

    pub uploaded_at: DateTime<Utc>,
}

/// A single upload as received from the client.
#[derive(Debug, Clone, Copy)]
pub struct NewAttachment<'a> {
    pub report_id: RecordId,
    pub uploaded_by: RecordId,
    pub original_filename: Option<&'a str>,
    pub declared_media_type: &'a str,
    pub bytes: &'a [u8],
}

/// Attachment storage for all reports
///
/// Writes hold the index lock, so the duplicate check and the file write for one upload cannot
/// interleave with another upload.
#[derive(Debug)]
pub struct AttachmentStore {
    /// Canonicalised upload root
    root_directory: PathBuf,

    validator: UploadValidator,

    index: RwLock<HashMap<RecordId, Vec<AttachmentMetadata>>>,
}

impl AttachmentStore {
    /// Creates a store rooted at `root_directory`, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidRootDirectory` if the path exists but is not a directory,
    /// or cannot be created or canonicalised.
    pub fn new(root_directory: &Path, validator: UploadValidator) -> Result<Self, FilesError> {
        if root_directory.exists() && !root_directory.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Path is not a directory: {}",
                root_directory.display()
            )));
        }

        fs::create_dir_all(root_directory).map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot create directory {}: {}",
                root_directory.display(),
                e
            ))
        })?;

        let root_directory = root_directory.canonicalize().map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot canonicalize path {}: {}",
                root_directory.display(),
                e
            ))
        })?;

        Ok(Self {
            root_directory,
            validator,
            index: RwLock::new(HashMap::new()),
        })
    }

    pub fn validator(&self) -> &UploadValidator {
        &self.validator
    }

    /// Validates and stores one upload
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - The upload fails validation (`Rejected`)
    /// - The same content is already attached to this report (`FileAlreadyExists`)
    /// - Directory creation or the file write fails (`Io`)
    pub fn add(&self, upload: NewAttachment<'_>) -> Result<AttachmentMetadata, FilesError> {
        let declared_media_type = self
            .validator
            .validate(upload.declared_media_type, upload.bytes.len() as u64)?;

        let hash = Sha256Hash::parse(&hex::encode(Sha256::digest(upload.bytes)))?;
        let original_filename = sanitise_filename(upload.original_filename)?;

        let mut index = self.index.write().unwrap_or_else(PoisonError::into_inner);

        let storage_path = self.compute_storage_path(&upload.report_id, hash.as_str());
        if storage_path.exists() {
            return Err(FilesError::FileAlreadyExists(hash.to_string()));
        }

        if let Some(parent) = storage_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                FilesError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create storage directory {}: {}",
                        parent.display(),
                        e
                    ),
                ))
            })?;
        }

        fs::write(&storage_path, upload.bytes).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write file to {}: {}", storage_path.display(), e),
            ))
        })?;

        let metadata = AttachmentMetadata {
            id: RecordId::new(),
            report_id: upload.report_id,
            original_filename,
            declared_media_type,
            detected_media_type: infer::get(upload.bytes).map(|kind| kind.mime_type().to_owned()),
            size_bytes: upload.bytes.len() as u64,
            hash,
            uploaded_by: upload.uploaded_by,
            uploaded_at: Utc::now(),
        };

        index
            .entry(upload.report_id)
            .or_default()
            .push(metadata.clone());
        Ok(metadata)
    }

    /// Attachments for a report, oldest first
    pub fn list(&self, report_id: &RecordId) -> Vec<AttachmentMetadata> {
        self.index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(report_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn find(&self, report_id: &RecordId, attachment_id: &RecordId) -> Option<AttachmentMetadata> {
        self.index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(report_id)?
            .iter()
            .find(|m| m.id == *attachment_id)
            .cloned()
    }

    /// Retrieves an attachment's metadata and bytes
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - No attachment with this id belongs to the report (`NotFound`)
    /// - The stored file cannot be read (`Io`)
    pub fn read(
        &self,
        report_id: &RecordId,
        attachment_id: &RecordId,
    ) -> Result<(AttachmentMetadata, Vec<u8>), FilesError> {
        let metadata = self
            .find(report_id, attachment_id)
            .ok_or_else(|| FilesError::NotFound(attachment_id.to_string()))?;

        let storage_path = self.compute_storage_path(report_id, metadata.hash.as_str());
        let bytes = fs::read(&storage_path).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read file from {}: {}", storage_path.display(), e),
            ))
        })?;

        Ok((metadata, bytes))
    }

    /// Absolute storage path: `<root>/<report_id>/files/sha256/<shard1>/<shard2>/<hash>`
    fn compute_storage_path(&self, report_id: &RecordId, hash_hex: &str) -> PathBuf {
        self.root_directory
            .join(report_id.to_string())
            .join(compute_relative_path(hash_hex))
    }
}

/// Path below a report folder: `files/sha256/<shard1>/<shard2>/<hash>`
fn compute_relative_path(hash_hex: &str) -> PathBuf {
    Path::new(FILES_FOLDER_NAME)
        .join(HASH_ALGORITHM)
        .join(&hash_hex[0..2])
        .join(&hash_hex[2..4])
        .join(hash_hex)
}

/// Keeps only the final path component so a filename can never address another location.
fn sanitise_filename(raw: Option<&str>) -> Result<NonEmptyText, FilesError> {
    let name = raw
        .and_then(|n| n.rsplit(['/', '\\']).next())
        .map(str::trim)
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
        .unwrap_or(DEFAULT_FILENAME);
    Ok(NonEmptyText::new(name)?)
}
