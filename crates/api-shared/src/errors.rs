//! Maps core errors onto the public error codes.

use crate::auth::AuthError;
use crate::envelope::{ErrorCode, ErrorResponse};
use serde_json::{json, Value};
use survey_core::{ConflictKind, SurveyError};
use survey_files::{FilesError, UploadRejection, ALLOWED_MEDIA_TYPES};

/// Builds the failure envelope for a core error.
///
/// Internal failures are logged here and reported with a generic message.
pub fn error_response(err: &SurveyError) -> ErrorResponse {
    let (code, message, details) = describe(err);
    ErrorResponse::new(code, message, details)
}

pub fn auth_error_response(err: &AuthError) -> ErrorResponse {
    match err {
        AuthError::WeakSecret | AuthError::InvalidTtl | AuthError::Encoding(_) => {
            tracing::error!("token handling failed: {err}");
            ErrorResponse::new(ErrorCode::InternalError, "internal server error", None)
        }
        _ => ErrorResponse::new(ErrorCode::Unauthorized, err.to_string(), None),
    }
}

fn describe(err: &SurveyError) -> (ErrorCode, String, Option<Value>) {
    let message = err.to_string();
    match err {
        SurveyError::Validation { details, .. } => (
            ErrorCode::ValidationError,
            message,
            Some(json!(details)),
        ),
        SurveyError::NotFound { resource, id } => (
            ErrorCode::NotFound,
            message,
            Some(json!({ "resource": resource, "id": id })),
        ),
        SurveyError::Conflict(kind) => (ErrorCode::Conflict, message, Some(conflict_details(kind))),
        SurveyError::Forbidden(details) => (
            ErrorCode::Forbidden,
            message,
            serde_json::to_value(details.as_ref()).ok(),
        ),
        SurveyError::Unauthenticated(_) => (ErrorCode::Unauthorized, message, None),
        SurveyError::Attachment(files) => describe_files(files, message),
        SurveyError::Internal(_) => internal(err),
    }
}

fn conflict_details(kind: &ConflictKind) -> Value {
    match kind {
        ConflictKind::VersionMismatch(mismatch) => json!(mismatch),
        ConflictKind::DuplicateSurvey {
            facility_id,
            survey_type,
            survey_year,
            existing_report_id,
        } => json!({
            "facilityId": facility_id,
            "surveyType": survey_type,
            "surveyYear": survey_year,
            "existingReportId": existing_report_id,
        }),
        ConflictKind::DuplicateUsername(username) => json!({ "username": username }),
    }
}

fn describe_files(err: &FilesError, message: String) -> (ErrorCode, String, Option<Value>) {
    match err {
        FilesError::Rejected(UploadRejection::SizeExceeded { limit, actual }) => (
            ErrorCode::PayloadTooLarge,
            message,
            Some(json!({ "limit": limit, "actual": actual })),
        ),
        FilesError::Rejected(UploadRejection::TypeRejected { media_type }) => (
            ErrorCode::ValidationError,
            message,
            Some(json!({ "mediaType": media_type, "allowed": ALLOWED_MEDIA_TYPES })),
        ),
        FilesError::Rejected(UploadRejection::Empty) => (ErrorCode::ValidationError, message, None),
        FilesError::FileAlreadyExists(hash) => {
            (ErrorCode::Conflict, message, Some(json!({ "hash": hash })))
        }
        FilesError::NotFound(id) => (
            ErrorCode::NotFound,
            message,
            Some(json!({ "resource": "attachment", "id": id })),
        ),
        FilesError::InvalidRootDirectory(_)
        | FilesError::Io(_)
        | FilesError::Digest(_)
        | FilesError::Filename(_) => {
            tracing::error!("attachment storage failed: {err}");
            (ErrorCode::InternalError, "internal server error".into(), None)
        }
    }
}

fn internal(err: &SurveyError) -> (ErrorCode, String, Option<Value>) {
    tracing::error!("request failed: {err}");
    (ErrorCode::InternalError, "internal server error".into(), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_core::{FieldIssue, ForbiddenDetails, Operation, ReportStatus, Role, SurveyType, VersionMismatch};
    use survey_uuid::RecordId;

    #[test]
    fn validation_lists_every_issue() {
        let err = SurveyError::validation(vec![
            FieldIssue::new("page", "must be an integer >= 1"),
            FieldIssue::new("limit", "must be an integer between 1 and 100"),
        ]);
        let body = error_response(&err);
        assert_eq!(body.status(), 400);
        let details = body.error.details.unwrap();
        assert_eq!(details[0]["field"], "page");
        assert_eq!(details[1]["field"], "limit");
    }

    #[test]
    fn version_mismatch_reports_both_versions() {
        let report_id = RecordId::new();
        let err = SurveyError::Conflict(ConflictKind::VersionMismatch(VersionMismatch {
            report_id,
            expected_version: 1,
            current_version: 2,
        }));
        let body = error_response(&err);
        assert_eq!(body.error.code, ErrorCode::Conflict);
        let details = body.error.details.unwrap();
        assert_eq!(details["expectedVersion"], 1);
        assert_eq!(details["currentVersion"], 2);
        assert_eq!(details["reportId"], report_id.to_string());
    }

    #[test]
    fn duplicate_survey_names_existing_report() {
        let existing = RecordId::new();
        let err = SurveyError::Conflict(ConflictKind::DuplicateSurvey {
            facility_id: "FAC-1".into(),
            survey_type: SurveyType::PatientSafety,
            survey_year: 2024,
            existing_report_id: existing,
        });
        let details = error_response(&err).error.details.unwrap();
        assert_eq!(details["facilityId"], "FAC-1");
        assert_eq!(details["surveyType"], "patient_safety");
        assert_eq!(details["existingReportId"], existing.to_string());
    }

    #[test]
    fn forbidden_carries_required_role() {
        let err = SurveyError::Forbidden(Box::new(ForbiddenDetails {
            operation: Operation::Edit,
            role: Role::Editor,
            status: Some(ReportStatus::ImmediateJeopardy),
            required_role: Role::Admin,
            allowed_roles: vec![Role::Admin],
            version_mismatch: None,
        }));
        let body = error_response(&err);
        assert_eq!(body.status(), 403);
        let details = body.error.details.unwrap();
        assert_eq!(details["requiredRole"], "admin");
        assert_eq!(details["status"], "immediate_jeopardy");
        assert!(details.get("versionMismatch").is_none());
    }

    #[test]
    fn oversized_upload_is_payload_too_large() {
        let err = SurveyError::Attachment(FilesError::Rejected(UploadRejection::SizeExceeded {
            limit: 10,
            actual: 11,
        }));
        let body = error_response(&err);
        assert_eq!(body.status(), 413);
        assert_eq!(body.error.details.unwrap()["limit"], 10);
    }

    #[test]
    fn internal_errors_hide_their_cause() {
        let body = error_response(&SurveyError::Internal("lock poisoned at store.rs".into()));
        assert_eq!(body.status(), 500);
        assert_eq!(body.error.message, "internal server error");
    }

    #[test]
    fn auth_failures_are_unauthorized() {
        let body = auth_error_response(&AuthError::TokenExpired);
        assert_eq!(body.error.code, ErrorCode::Unauthorized);
        let body = auth_error_response(&AuthError::WeakSecret);
        assert_eq!(body.error.code, ErrorCode::InternalError);
    }
}
