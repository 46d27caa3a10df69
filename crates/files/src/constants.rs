//! Constants for attachment storage.

/// Directory under each report folder that holds attachment bytes.
pub const FILES_FOLDER_NAME: &str = "files";

/// Hash algorithm segment of the storage path.
pub const HASH_ALGORITHM: &str = "sha256";

/// Filename recorded when the client sends none.
pub const DEFAULT_FILENAME: &str = "unnamed";

/// Media types accepted for upload.
pub const ALLOWED_MEDIA_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/png",
    "text/plain",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];
