//! Request payload validation.
//!
//! Payloads deserialize into loosely typed request structs (unknown fields rejected), then
//! `validate()` converts them into the typed inputs the services accept. Every problem is
//! collected so a caller sees all offending fields in one response.

use crate::error::{FieldIssue, SurveyError, SurveyResult};
use crate::model::{AccreditationBody, NewDeficiency, NewReport, ReportPatch, Severity, SurveyType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::str::FromStr;
use survey_types::{ComplianceScore, NonEmptyText};
use utoipa::ToSchema;

/// Parses a date as RFC 3339 or as a bare `YYYY-MM-DD` (taken as midnight UTC).
pub fn parse_date(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("'{raw}' is not a valid date (RFC 3339 or YYYY-MM-DD)"))
}

#[derive(Default)]
struct Issues(Vec<FieldIssue>);

impl Issues {
    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldIssue::new(field, message));
    }

    fn required<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.push(field, "is required");
        }
        value
    }

    fn text(&mut self, field: &str, value: Option<&str>) -> Option<NonEmptyText> {
        let value = value?;
        NonEmptyText::new(value)
            .map_err(|e| self.push(field, e.to_string()))
            .ok()
    }

    fn variant<T: FromStr>(&mut self, field: &str, value: Option<&str>) -> Option<T>
    where
        T::Err: std::fmt::Display,
    {
        value?
            .parse::<T>()
            .map_err(|e| self.push(field, e.to_string()))
            .ok()
    }

    fn date(&mut self, field: &str, value: Option<&str>) -> Option<DateTime<Utc>> {
        parse_date(value?).map_err(|e| self.push(field, e)).ok()
    }

    fn scope(&mut self, value: Option<&[String]>) -> Option<Vec<NonEmptyText>> {
        let items = value?;
        if items.is_empty() {
            self.push("surveyScope", "must contain at least one area");
            return None;
        }
        let mut scope = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match NonEmptyText::new(item) {
                Ok(area) => scope.push(area),
                Err(e) => self.push(&format!("surveyScope[{i}]"), e.to_string()),
            }
        }
        (scope.len() == items.len()).then_some(scope)
    }

    fn version(&mut self, value: Option<i64>) -> Option<u64> {
        match self.required("version", value) {
            Some(v) if v >= 1 => Some(v as u64),
            Some(_) => {
                self.push("version", "must be an integer >= 1");
                None
            }
            None => None,
        }
    }

    fn finish<T>(self, value: impl FnOnce() -> Option<T>) -> SurveyResult<T> {
        if !self.0.is_empty() {
            return Err(SurveyError::validation(self.0));
        }
        value().ok_or_else(|| SurveyError::Internal("validated payload incomplete".into()))
    }
}

/// Body of `POST /api/reports`.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateReportRequest {
    pub facility_id: Option<String>,
    /// `comprehensive`, `medication_management`, `infection_control` or `patient_safety`
    pub survey_type: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`
    pub survey_date: Option<String>,
    pub lead_surveyor: Option<String>,
    pub survey_scope: Option<Vec<String>>,
    /// `Joint Commission`, `ACHC` or `DNV`
    pub accreditation_body: Option<String>,
    pub corrective_action_due: Option<String>,
    pub follow_up_required: Option<bool>,
}

impl CreateReportRequest {
    pub fn validate(&self) -> SurveyResult<NewReport> {
        let mut issues = Issues::default();

        let facility_id = issues.required("facilityId", self.facility_id.as_deref());
        let facility_id = issues.text("facilityId", facility_id);
        let survey_type = issues.required("surveyType", self.survey_type.as_deref());
        let survey_type = issues.variant::<SurveyType>("surveyType", survey_type);
        let survey_date = issues.required("surveyDate", self.survey_date.as_deref());
        let survey_date = issues.date("surveyDate", survey_date);
        let lead_surveyor = issues.required("leadSurveyor", self.lead_surveyor.as_deref());
        let lead_surveyor = issues.text("leadSurveyor", lead_surveyor);
        let survey_scope = issues.required("surveyScope", self.survey_scope.as_deref());
        let survey_scope = issues.scope(survey_scope);
        let body = issues.required("accreditationBody", self.accreditation_body.as_deref());
        let accreditation_body = issues.variant::<AccreditationBody>("accreditationBody", body);
        let corrective_action_due =
            issues.date("correctiveActionDue", self.corrective_action_due.as_deref());

        issues.finish(|| {
            Some(NewReport {
                facility_id: facility_id?,
                survey_type: survey_type?,
                survey_date: survey_date?,
                lead_surveyor: lead_surveyor?,
                survey_scope: survey_scope?,
                accreditation_body: accreditation_body?,
                corrective_action_due,
                follow_up_required: self.follow_up_required,
            })
        })
    }
}

/// Body of `PUT /api/reports/{id}`. Omitted fields are left unchanged.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateReportRequest {
    pub survey_type: Option<String>,
    pub lead_surveyor: Option<String>,
    pub survey_scope: Option<Vec<String>>,
    /// Integer 0..=100
    pub compliance_score: Option<i64>,
    /// `compliant`, `deficient` or `immediate_jeopardy`
    pub status: Option<String>,
    pub corrective_action_due: Option<String>,
    pub follow_up_required: Option<bool>,
    /// Version the client last read
    pub version: Option<i64>,
}

impl UpdateReportRequest {
    /// Returns the patch and the client's expected version.
    pub fn validate(&self) -> SurveyResult<(ReportPatch, u64)> {
        let mut issues = Issues::default();

        let version = issues.version(self.version);
        let compliance_score = self.compliance_score.and_then(|score| {
            ComplianceScore::new(score)
                .map_err(|e| issues.push("complianceScore", e.to_string()))
                .ok()
        });

        let patch = ReportPatch {
            survey_type: issues.variant("surveyType", self.survey_type.as_deref()),
            lead_surveyor: issues.text("leadSurveyor", self.lead_surveyor.as_deref()),
            survey_scope: issues.scope(self.survey_scope.as_deref()),
            compliance_score,
            status: issues.variant("status", self.status.as_deref()),
            corrective_action_due: issues
                .date("correctiveActionDue", self.corrective_action_due.as_deref()),
            follow_up_required: self.follow_up_required,
        };

        let nothing_requested = self.survey_type.is_none()
            && self.lead_surveyor.is_none()
            && self.survey_scope.is_none()
            && self.compliance_score.is_none()
            && self.status.is_none()
            && self.corrective_action_due.is_none()
            && self.follow_up_required.is_none();
        if nothing_requested {
            issues.push("body", "at least one updatable field is required");
        }

        issues.finish(|| Some((patch, version?)))
    }
}

/// Body of `POST /api/reports/{id}/deficiencies`.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AppendDeficiencyRequest {
    pub standard_code: Option<String>,
    pub description: Option<String>,
    /// `minor`, `major` or `immediate_jeopardy`
    pub severity: Option<String>,
    pub due_date: Option<String>,
    pub version: Option<i64>,
}

impl AppendDeficiencyRequest {
    pub fn validate(&self) -> SurveyResult<(NewDeficiency, u64)> {
        let mut issues = Issues::default();

        let code = issues.required("standardCode", self.standard_code.as_deref());
        let standard_code = issues.text("standardCode", code);
        let description = issues.required("description", self.description.as_deref());
        let description = issues.text("description", description);
        let severity = issues.required("severity", self.severity.as_deref());
        let severity = issues.variant::<Severity>("severity", severity);
        let due_date = issues.date("dueDate", self.due_date.as_deref());
        let version = issues.version(self.version);

        issues.finish(|| {
            Some((
                NewDeficiency {
                    standard_code: standard_code?,
                    description: description?,
                    severity: severity?,
                    due_date,
                },
                version?,
            ))
        })
    }
}

/// Body of `POST /api/reports/{id}/notes`.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddNoteRequest {
    pub note: Option<String>,
    pub version: Option<i64>,
}

impl AddNoteRequest {
    pub fn validate(&self) -> SurveyResult<(NonEmptyText, u64)> {
        let mut issues = Issues::default();
        let note = issues.required("note", self.note.as_deref());
        let note = issues.text("note", note);
        let version = issues.version(self.version);
        issues.finish(|| Some((note?, version?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReportStatus;
    use chrono::{Datelike, Timelike};

    fn issue_fields(err: SurveyError) -> Vec<String> {
        match err {
            SurveyError::Validation { details, .. } => {
                details.into_iter().map(|i| i.field).collect()
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    fn valid_create() -> CreateReportRequest {
        CreateReportRequest {
            facility_id: Some("FAC-001".into()),
            survey_type: Some("comprehensive".into()),
            survey_date: Some("2024-03-15".into()),
            lead_surveyor: Some("Dr. Lee".into()),
            survey_scope: Some(vec!["Emergency".into(), "Pharmacy".into()]),
            accreditation_body: Some("Joint Commission".into()),
            corrective_action_due: None,
            follow_up_required: None,
        }
    }

    #[test]
    fn parse_date_accepts_both_forms() {
        let day = parse_date("2024-03-15").unwrap();
        assert_eq!((day.year(), day.month(), day.day(), day.hour()), (2024, 3, 15, 0));

        let ts = parse_date("2024-03-15T10:30:00+02:00").unwrap();
        assert_eq!(ts.hour(), 8);

        assert!(parse_date("15/03/2024").is_err());
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn valid_create_produces_typed_input() {
        let input = valid_create().validate().unwrap();
        assert_eq!(input.facility_id.as_str(), "FAC-001");
        assert_eq!(input.survey_type, SurveyType::Comprehensive);
        assert_eq!(input.survey_scope.len(), 2);
        assert_eq!(input.accreditation_body, AccreditationBody::JointCommission);
        assert!(input.corrective_action_due.is_none());
    }

    #[test]
    fn create_collects_every_issue() {
        let request = CreateReportRequest {
            facility_id: Some("   ".into()),
            survey_type: Some("annual".into()),
            survey_scope: Some(vec![]),
            accreditation_body: Some("ISO".into()),
            ..Default::default()
        };
        let fields = issue_fields(request.validate().unwrap_err());
        assert_eq!(
            fields,
            [
                "facilityId",
                "surveyType",
                "surveyDate",
                "leadSurveyor",
                "surveyScope",
                "accreditationBody"
            ]
        );
    }

    #[test]
    fn blank_scope_item_is_named_by_index() {
        let mut request = valid_create();
        request.survey_scope = Some(vec!["Lab".into(), " ".into()]);
        assert_eq!(issue_fields(request.validate().unwrap_err()), ["surveyScope[1]"]);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let json = r#"{"facilityId":"F","status":"compliant"}"#;
        assert!(serde_json::from_str::<CreateReportRequest>(json).is_err());
    }

    #[test]
    fn update_requires_version_and_a_field() {
        let fields = issue_fields(UpdateReportRequest::default().validate().unwrap_err());
        assert_eq!(fields, ["version", "body"]);

        let request = UpdateReportRequest {
            version: Some(0),
            compliance_score: Some(101),
            status: Some("archived".into()),
            ..Default::default()
        };
        let fields = issue_fields(request.validate().unwrap_err());
        assert_eq!(fields, ["version", "complianceScore", "status"]);
    }

    #[test]
    fn update_only_sets_supplied_fields() {
        let request: UpdateReportRequest =
            serde_json::from_str(r#"{"followUpRequired":true,"version":3}"#).unwrap();
        let (patch, version) = request.validate().unwrap();
        assert_eq!(version, 3);
        assert_eq!(
            patch,
            ReportPatch {
                follow_up_required: Some(true),
                ..Default::default()
            }
        );
    }

    #[test]
    fn update_parses_status_and_score() {
        let request = UpdateReportRequest {
            status: Some("immediate_jeopardy".into()),
            compliance_score: Some(0),
            version: Some(1),
            ..Default::default()
        };
        let (patch, _) = request.validate().unwrap();
        assert_eq!(patch.status, Some(ReportStatus::ImmediateJeopardy));
        assert_eq!(patch.compliance_score.map(|s| s.value()), Some(0));
    }

    #[test]
    fn append_deficiency_validation() {
        let request = AppendDeficiencyRequest {
            standard_code: Some("IC.02.01.01".into()),
            description: Some("Hand hygiene lapses".into()),
            severity: Some("major".into()),
            due_date: Some("2024-05-01".into()),
            version: Some(2),
        };
        let (deficiency, version) = request.validate().unwrap();
        assert_eq!(deficiency.severity, Severity::Major);
        assert!(deficiency.due_date.is_some());
        assert_eq!(version, 2);

        let fields = issue_fields(AppendDeficiencyRequest::default().validate().unwrap_err());
        assert_eq!(fields, ["standardCode", "description", "severity", "version"]);
    }

    #[test]
    fn note_must_not_be_blank() {
        let request = AddNoteRequest {
            note: Some("  ".into()),
            version: Some(1),
        };
        assert_eq!(issue_fields(request.validate().unwrap_err()), ["note"]);
    }
}
