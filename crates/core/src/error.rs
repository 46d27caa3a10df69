//! Error taxonomy for the survey core.
//!
//! Every variant is terminal for the request that produced it: nothing here is retried
//! internally. The one transient condition in the core, a failed notification, lives in
//! [`crate::notification::NotificationError`] and never reaches callers.

use crate::model::{ReportStatus, Role, SurveyType};
use serde::Serialize;
use survey_files::FilesError;
use survey_uuid::RecordId;

/// A single field-level validation problem.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Stale client version detected at write time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMismatch {
    pub report_id: RecordId,
    pub expected_version: u64,
    pub current_version: u64,
}

/// Business-invariant violations reported as `CONFLICT`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConflictKind {
    VersionMismatch(VersionMismatch),
    DuplicateSurvey {
        facility_id: String,
        survey_type: SurveyType,
        survey_year: i32,
        existing_report_id: RecordId,
    },
    DuplicateUsername(String),
}

/// Operation classes evaluated by the authorization policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Upload,
    Edit,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Upload => "upload",
            Operation::Edit => "edit",
        }
    }
}

/// Details carried by a policy denial so callers can render an actionable message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForbiddenDetails {
    pub operation: Operation,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReportStatus>,
    /// Lowest role that would have been permitted.
    pub required_role: Role,
    pub allowed_roles: Vec<Role>,
    /// Set when the denied request was also stale, so neither condition is hidden.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_mismatch: Option<VersionMismatch>,
}

#[derive(Debug, thiserror::Error)]
pub enum SurveyError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<FieldIssue>,
    },
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },
    #[error("{}", conflict_message(.0))]
    Conflict(ConflictKind),
    #[error("{}", forbidden_message(.0))]
    Forbidden(Box<ForbiddenDetails>),
    #[error("authentication failed: {0}")]
    Unauthenticated(String),
    /// Upload rejection or attachment storage failure.
    #[error(transparent)]
    Attachment(#[from] FilesError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl SurveyError {
    /// Validation failure carrying one issue per offending field.
    pub fn validation(details: Vec<FieldIssue>) -> Self {
        let message = match details.as_slice() {
            [single] => format!("{}: {}", single.field, single.message),
            _ => format!("request failed validation ({} issues)", details.len()),
        };
        SurveyError::Validation { message, details }
    }

    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        Self::validation(vec![FieldIssue::new(field, message)])
    }

    pub fn report_not_found(id: &RecordId) -> Self {
        SurveyError::NotFound {
            resource: "report",
            id: id.to_string(),
        }
    }
}

fn conflict_message(kind: &ConflictKind) -> String {
    match kind {
        ConflictKind::VersionMismatch(m) => format!(
            "report {} has been modified: expected version {}, current version {}",
            m.report_id, m.expected_version, m.current_version
        ),
        ConflictKind::DuplicateSurvey {
            facility_id,
            survey_type,
            survey_year,
            existing_report_id,
        } => format!(
            "a {} survey for facility {} in {} already exists (report {})",
            survey_type.as_str(),
            facility_id,
            survey_year,
            existing_report_id
        ),
        ConflictKind::DuplicateUsername(name) => format!("username already taken: {name}"),
    }
}

fn forbidden_message(details: &ForbiddenDetails) -> String {
    match details.status {
        Some(status) => format!(
            "role '{}' may not {} a report with status '{}'; requires '{}'",
            details.role.as_str(),
            details.operation.as_str(),
            status.as_str(),
            details.required_role.as_str()
        ),
        None => format!(
            "role '{}' may not {} reports; requires '{}'",
            details.role.as_str(),
            details.operation.as_str(),
            details.required_role.as_str()
        ),
    }
}

pub type SurveyResult<T> = std::result::Result<T, SurveyError>;
