//! Authorization policy.
//!
//! Two pure decision tables:
//! - coarse operation gate: which roles may create reports or upload attachments;
//! - status gate: which roles may edit a report, keyed by the report's *current* status.
//!
//! `ReportStatus` is a closed enumeration, so an unrecognised status never reaches this module:
//! it is rejected when the value is parsed.

use crate::error::{ForbiddenDetails, Operation, SurveyError, SurveyResult, VersionMismatch};
use crate::model::{ReportStatus, Role};

const EDITOR_OR_ADMIN: &[Role] = &[Role::Editor, Role::Admin];
const ADMIN_ONLY: &[Role] = &[Role::Admin];
const ANY_ROLE: &[Role] = &[Role::Reader, Role::Editor, Role::Admin];

/// Roles permitted to perform a status-independent operation.
pub fn operation_roles(operation: Operation) -> &'static [Role] {
    match operation {
        Operation::Create | Operation::Upload => EDITOR_OR_ADMIN,
        // Edits are decided per status; without one nobody qualifies.
        Operation::Edit => &[],
    }
}

/// Roles permitted to edit a report currently in `status`.
pub fn edit_roles(status: ReportStatus) -> &'static [Role] {
    match status {
        ReportStatus::ImmediateJeopardy => ADMIN_ONLY,
        ReportStatus::Deficient => EDITOR_OR_ADMIN,
        // Readers may edit compliant reports. Field-level limits are not applied.
        ReportStatus::Compliant => ANY_ROLE,
    }
}

pub fn can_perform(role: Role, operation: Operation) -> bool {
    operation_roles(operation).contains(&role)
}

pub fn can_edit(role: Role, status: ReportStatus) -> bool {
    edit_roles(status).contains(&role)
}

/// Coarse create/upload gate.
///
/// # Errors
///
/// Returns `SurveyError::Forbidden` naming the role and the roles that would be allowed.
pub fn authorize_operation(role: Role, operation: Operation) -> SurveyResult<()> {
    if can_perform(role, operation) {
        return Ok(());
    }
    Err(forbidden(role, operation, None, operation_roles(operation), None))
}

/// Status-based edit gate.
///
/// `stale` is attached to the denial when the request was also made against an outdated
/// version, so the caller learns about both problems at once.
///
/// # Errors
///
/// Returns `SurveyError::Forbidden` with role, current status and required role.
pub fn authorize_edit(
    role: Role,
    status: ReportStatus,
    stale: Option<VersionMismatch>,
) -> SurveyResult<()> {
    if can_edit(role, status) {
        return Ok(());
    }
    Err(forbidden(
        role,
        Operation::Edit,
        Some(status),
        edit_roles(status),
        stale,
    ))
}

fn forbidden(
    role: Role,
    operation: Operation,
    status: Option<ReportStatus>,
    allowed: &[Role],
    version_mismatch: Option<VersionMismatch>,
) -> SurveyError {
    let required_role = allowed.iter().copied().min().unwrap_or(Role::Admin);
    SurveyError::Forbidden(Box::new(ForbiddenDetails {
        operation,
        role,
        status,
        required_role,
        allowed_roles: allowed.to_vec(),
        version_mismatch,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_uuid::RecordId;

    #[test]
    fn edit_table_matches_every_status_role_pair() {
        let expected = [
            (ReportStatus::Compliant, Role::Reader, true),
            (ReportStatus::Compliant, Role::Editor, true),
            (ReportStatus::Compliant, Role::Admin, true),
            (ReportStatus::Deficient, Role::Reader, false),
            (ReportStatus::Deficient, Role::Editor, true),
            (ReportStatus::Deficient, Role::Admin, true),
            (ReportStatus::ImmediateJeopardy, Role::Reader, false),
            (ReportStatus::ImmediateJeopardy, Role::Editor, false),
            (ReportStatus::ImmediateJeopardy, Role::Admin, true),
        ];

        for (status, role, allowed) in expected {
            assert_eq!(
                can_edit(role, status),
                allowed,
                "{} editing {}",
                role.as_str(),
                status.as_str()
            );
            assert_eq!(authorize_edit(role, status, None).is_ok(), allowed);
        }
    }

    #[test]
    fn unrecognised_status_never_reaches_policy() {
        for raw in ["archived", "pending", "", "COMPLIANT"] {
            assert!(raw.parse::<ReportStatus>().is_err());
        }
    }

    #[test]
    fn create_and_upload_exclude_readers() {
        for operation in [Operation::Create, Operation::Upload] {
            assert!(authorize_operation(Role::Reader, operation).is_err());
            assert!(authorize_operation(Role::Editor, operation).is_ok());
            assert!(authorize_operation(Role::Admin, operation).is_ok());
        }
    }

    #[test]
    fn immediate_jeopardy_denial_requires_admin() {
        let err = authorize_edit(Role::Editor, ReportStatus::ImmediateJeopardy, None).unwrap_err();
        match err {
            SurveyError::Forbidden(details) => {
                assert_eq!(details.role, Role::Editor);
                assert_eq!(details.status, Some(ReportStatus::ImmediateJeopardy));
                assert_eq!(details.required_role, Role::Admin);
                assert_eq!(details.allowed_roles, vec![Role::Admin]);
                assert!(details.version_mismatch.is_none());
            }
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }

    #[test]
    fn deficient_denial_names_editor_as_minimum() {
        let err = authorize_edit(Role::Reader, ReportStatus::Deficient, None).unwrap_err();
        let SurveyError::Forbidden(details) = err else {
            panic!("expected Forbidden");
        };
        assert_eq!(details.required_role, Role::Editor);
        assert_eq!(details.allowed_roles, vec![Role::Editor, Role::Admin]);
        assert_eq!(details.status, Some(ReportStatus::Deficient));
    }

    #[test]
    fn denial_carries_stale_version() {
        let stale = VersionMismatch {
            report_id: RecordId::new(),
            expected_version: 1,
            current_version: 3,
        };
        let err = authorize_edit(
            Role::Reader,
            ReportStatus::ImmediateJeopardy,
            Some(stale.clone()),
        )
        .unwrap_err();
        let SurveyError::Forbidden(details) = err else {
            panic!("expected Forbidden");
        };
        assert_eq!(details.version_mismatch, Some(stale));
    }
}
