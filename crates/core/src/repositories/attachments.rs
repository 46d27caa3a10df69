//! Report attachments.
//!
//! Uploads are checked against the upload role and the report's existence, then handed to the
//! attachment store. They never pass through the mutation pipeline: the report's version and
//! `updatedAt` stay as they were.

use crate::error::{Operation, SurveyError, SurveyResult};
use crate::model::Actor;
use crate::policy;
use crate::store::ReportStore;
use std::sync::Arc;
use survey_files::{AttachmentMetadata, AttachmentStore, FilesError, NewAttachment};
use survey_uuid::RecordId;

#[derive(Clone)]
pub struct AttachmentService {
    reports: Arc<dyn ReportStore>,
    files: Arc<AttachmentStore>,
}

/// One file as received from the client.
#[derive(Debug, Clone, Copy)]
pub struct Upload<'a> {
    pub original_filename: Option<&'a str>,
    pub media_type: &'a str,
    pub bytes: &'a [u8],
}

impl AttachmentService {
    pub fn new(reports: Arc<dyn ReportStore>, files: Arc<AttachmentStore>) -> Self {
        Self { reports, files }
    }

    /// Largest accepted upload, in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.files.validator().max_bytes()
    }

    fn ensure_report(&self, report_id: &RecordId) -> SurveyResult<()> {
        match self.reports.find(report_id) {
            Some(_) => Ok(()),
            None => Err(SurveyError::report_not_found(report_id)),
        }
    }

    /// Stores an attachment for `report_id`.
    ///
    /// # Errors
    ///
    /// - `SurveyError::Forbidden` if the actor's role may not upload.
    /// - `SurveyError::NotFound` if the report does not exist.
    /// - `SurveyError::Attachment` if the file is rejected or cannot be stored.
    pub fn upload(
        &self,
        actor: Actor,
        report_id: &RecordId,
        upload: Upload<'_>,
    ) -> SurveyResult<AttachmentMetadata> {
        policy::authorize_operation(actor.role, Operation::Upload)?;
        self.ensure_report(report_id)?;

        let result = self.files.add(NewAttachment {
            report_id: *report_id,
            uploaded_by: actor.id,
            original_filename: upload.original_filename,
            declared_media_type: upload.media_type,
            bytes: upload.bytes,
        });

        match result {
            Ok(metadata) => {
                tracing::info!(
                    report_id = %report_id,
                    attachment_id = %metadata.id,
                    size_bytes = metadata.size_bytes,
                    "attachment stored"
                );
                Ok(metadata)
            }
            Err(FilesError::Rejected(reason)) => {
                tracing::warn!(report_id = %report_id, actor_id = %actor.id, "upload rejected: {reason}");
                Err(FilesError::Rejected(reason).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// # Errors
    ///
    /// Returns `SurveyError::NotFound` if the report does not exist.
    pub fn list(&self, report_id: &RecordId) -> SurveyResult<Vec<AttachmentMetadata>> {
        self.ensure_report(report_id)?;
        Ok(self.files.list(report_id))
    }

    /// # Errors
    ///
    /// Returns `SurveyError::NotFound` if the report or the attachment does not exist.
    pub fn download(
        &self,
        report_id: &RecordId,
        attachment_id: &RecordId,
    ) -> SurveyResult<(AttachmentMetadata, Vec<u8>)> {
        self.ensure_report(report_id)?;
        self.files
            .read(report_id, attachment_id)
            .map_err(|e| match e {
                FilesError::NotFound(id) => SurveyError::NotFound {
                    resource: "attachment",
                    id,
                },
                other => other.into(),
            })
    }
}
