//! Survey report data model.
//!
//! Closed enumerations parse at the boundary via [`FromStr`]; anything outside the known set is
//! rejected before it reaches business logic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use survey_types::{ComplianceScore, NonEmptyText};
use survey_uuid::RecordId;
use utoipa::ToSchema;

// ============================================================================
// ENUMERATIONS
// ============================================================================

/// Returned when a string does not name a member of a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("must be one of [{}], got '{}'", .expected.join(", "), .value)]
pub struct UnknownVariant {
    pub value: String,
    pub expected: &'static [&'static str],
}

fn parse_variant<T: Copy>(
    value: &str,
    table: &[(&'static str, T)],
    expected: &'static [&'static str],
) -> Result<T, UnknownVariant> {
    table
        .iter()
        .find(|(name, _)| *name == value)
        .map(|(_, v)| *v)
        .ok_or_else(|| UnknownVariant {
            value: value.to_owned(),
            expected,
        })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SurveyType {
    Comprehensive,
    MedicationManagement,
    InfectionControl,
    PatientSafety,
}

impl SurveyType {
    pub const NAMES: &'static [&'static str] = &[
        "comprehensive",
        "medication_management",
        "infection_control",
        "patient_safety",
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SurveyType::Comprehensive => "comprehensive",
            SurveyType::MedicationManagement => "medication_management",
            SurveyType::InfectionControl => "infection_control",
            SurveyType::PatientSafety => "patient_safety",
        }
    }
}

impl FromStr for SurveyType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant(
            s,
            &[
                ("comprehensive", SurveyType::Comprehensive),
                ("medication_management", SurveyType::MedicationManagement),
                ("infection_control", SurveyType::InfectionControl),
                ("patient_safety", SurveyType::PatientSafety),
            ],
            Self::NAMES,
        )
    }
}

/// Overall outcome of a survey. Drives edit authorization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Compliant,
    Deficient,
    ImmediateJeopardy,
}

impl ReportStatus {
    pub const NAMES: &'static [&'static str] = &["compliant", "deficient", "immediate_jeopardy"];

    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Compliant => "compliant",
            ReportStatus::Deficient => "deficient",
            ReportStatus::ImmediateJeopardy => "immediate_jeopardy",
        }
    }
}

impl FromStr for ReportStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant(
            s,
            &[
                ("compliant", ReportStatus::Compliant),
                ("deficient", ReportStatus::Deficient),
                ("immediate_jeopardy", ReportStatus::ImmediateJeopardy),
            ],
            Self::NAMES,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum AccreditationBody {
    #[serde(rename = "Joint Commission")]
    JointCommission,
    #[serde(rename = "ACHC")]
    Achc,
    #[serde(rename = "DNV")]
    Dnv,
}

impl AccreditationBody {
    pub const NAMES: &'static [&'static str] = &["Joint Commission", "ACHC", "DNV"];

    pub fn as_str(self) -> &'static str {
        match self {
            AccreditationBody::JointCommission => "Joint Commission",
            AccreditationBody::Achc => "ACHC",
            AccreditationBody::Dnv => "DNV",
        }
    }
}

impl FromStr for AccreditationBody {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant(
            s,
            &[
                ("Joint Commission", AccreditationBody::JointCommission),
                ("ACHC", AccreditationBody::Achc),
                ("DNV", AccreditationBody::Dnv),
            ],
            Self::NAMES,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Major,
    ImmediateJeopardy,
}

impl Severity {
    pub const NAMES: &'static [&'static str] = &["minor", "major", "immediate_jeopardy"];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Minor => "minor",
            Severity::Major => "major",
            Severity::ImmediateJeopardy => "immediate_jeopardy",
        }
    }

    /// Fixed ordering rank: immediate jeopardy (3) > major (2) > minor (1).
    pub fn rank(self) -> u8 {
        match self {
            Severity::Minor => 1,
            Severity::Major => 2,
            Severity::ImmediateJeopardy => 3,
        }
    }
}

impl FromStr for Severity {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant(
            s,
            &[
                ("minor", Severity::Minor),
                ("major", Severity::Major),
                ("immediate_jeopardy", Severity::ImmediateJeopardy),
            ],
            Self::NAMES,
        )
    }
}

/// Actor role, resolved by the identity layer before the core sees a request.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Reader,
    Editor,
    Admin,
}

impl Role {
    pub const NAMES: &'static [&'static str] = &["reader", "editor", "admin"];
    pub const ALL: [Role; 3] = [Role::Reader, Role::Editor, Role::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Reader => "reader",
            Role::Editor => "editor",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant(
            s,
            &[
                ("reader", Role::Reader),
                ("editor", Role::Editor),
                ("admin", Role::Admin),
            ],
            Self::NAMES,
        )
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// The already-authenticated caller of a core operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: RecordId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: RecordId, role: Role) -> Self {
        Self { id, role }
    }
}

/// A single regulatory finding. Immutable once attached to a report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Deficiency {
    #[schema(value_type = String)]
    pub id: RecordId,
    #[schema(value_type = String)]
    pub standard_code: NonEmptyText,
    #[schema(value_type = String)]
    pub description: NonEmptyText,
    pub severity: Severity,
    pub due_date: Option<DateTime<Utc>>,
}

/// One accreditation survey report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[schema(value_type = String)]
    pub id: RecordId,
    #[schema(value_type = String)]
    pub facility_id: NonEmptyText,
    pub survey_type: SurveyType,
    pub survey_date: DateTime<Utc>,
    #[schema(value_type = String)]
    pub lead_surveyor: NonEmptyText,
    #[schema(value_type = Vec<String>)]
    pub survey_scope: Vec<NonEmptyText>,
    #[schema(value_type = u8)]
    pub compliance_score: ComplianceScore,
    pub status: ReportStatus,
    pub accreditation_body: AccreditationBody,
    pub deficiencies: Vec<Deficiency>,
    pub corrective_action_due: DateTime<Utc>,
    pub follow_up_required: bool,
    #[schema(value_type = Vec<String>)]
    pub surveyor_notes: Vec<NonEmptyText>,
    #[schema(value_type = String)]
    pub created_by: RecordId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Starts at 1 and increases by exactly 1 on every successful mutation.
    pub version: u64,
}

// ============================================================================
// VALIDATED INPUTS
// ============================================================================

/// Validated creation payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewReport {
    pub facility_id: NonEmptyText,
    pub survey_type: SurveyType,
    pub survey_date: DateTime<Utc>,
    pub lead_surveyor: NonEmptyText,
    pub survey_scope: Vec<NonEmptyText>,
    pub accreditation_body: AccreditationBody,
    pub corrective_action_due: Option<DateTime<Utc>>,
    pub follow_up_required: Option<bool>,
}

/// Validated partial update. `None` leaves the stored value untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportPatch {
    pub survey_type: Option<SurveyType>,
    pub lead_surveyor: Option<NonEmptyText>,
    pub survey_scope: Option<Vec<NonEmptyText>>,
    pub compliance_score: Option<ComplianceScore>,
    pub status: Option<ReportStatus>,
    pub corrective_action_due: Option<DateTime<Utc>>,
    pub follow_up_required: Option<bool>,
}

impl ReportPatch {
    pub fn is_empty(&self) -> bool {
        self.survey_type.is_none()
            && self.lead_surveyor.is_none()
            && self.survey_scope.is_none()
            && self.compliance_score.is_none()
            && self.status.is_none()
            && self.corrective_action_due.is_none()
            && self.follow_up_required.is_none()
    }

    /// Copies every present field onto `report`.
    pub fn apply_to(&self, report: &mut Report) {
        if let Some(survey_type) = self.survey_type {
            report.survey_type = survey_type;
        }
        if let Some(lead_surveyor) = &self.lead_surveyor {
            report.lead_surveyor = lead_surveyor.clone();
        }
        if let Some(scope) = &self.survey_scope {
            report.survey_scope = scope.clone();
        }
        if let Some(score) = self.compliance_score {
            report.compliance_score = score;
        }
        if let Some(status) = self.status {
            report.status = status;
        }
        if let Some(due) = self.corrective_action_due {
            report.corrective_action_due = due;
        }
        if let Some(follow_up) = self.follow_up_required {
            report.follow_up_required = follow_up;
        }
    }
}

/// Validated deficiency to append to a report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewDeficiency {
    pub standard_code: NonEmptyText,
    pub description: NonEmptyText,
    pub severity: Severity,
    pub due_date: Option<DateTime<Utc>>,
}

impl NewDeficiency {
    pub fn into_deficiency(self) -> Deficiency {
        Deficiency {
            id: RecordId::new(),
            standard_code: self.standard_code,
            description: self.description,
            severity: self.severity,
            due_date: self.due_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_round_trip_through_names() {
        for name in SurveyType::NAMES {
            assert_eq!(name.parse::<SurveyType>().unwrap().as_str(), *name);
        }
        for name in ReportStatus::NAMES {
            assert_eq!(name.parse::<ReportStatus>().unwrap().as_str(), *name);
        }
        for name in AccreditationBody::NAMES {
            assert_eq!(name.parse::<AccreditationBody>().unwrap().as_str(), *name);
        }
        for name in Severity::NAMES {
            assert_eq!(name.parse::<Severity>().unwrap().as_str(), *name);
        }
        for name in Role::NAMES {
            assert_eq!(name.parse::<Role>().unwrap().as_str(), *name);
        }
    }

    #[test]
    fn unknown_variants_are_rejected() {
        let err = "archived".parse::<ReportStatus>().unwrap_err();
        assert_eq!(err.value, "archived");
        assert!(err.to_string().contains("compliant"));
        assert!("Compliant".parse::<ReportStatus>().is_err());
        assert!("superuser".parse::<Role>().is_err());
        assert!("joint commission".parse::<AccreditationBody>().is_err());
    }

    #[test]
    fn severity_rank_orders_immediate_jeopardy_highest() {
        assert!(Severity::ImmediateJeopardy.rank() > Severity::Major.rank());
        assert!(Severity::Major.rank() > Severity::Minor.rank());
    }

    #[test]
    fn accreditation_body_serialises_display_names() {
        let json = serde_json::to_string(&AccreditationBody::JointCommission).unwrap();
        assert_eq!(json, "\"Joint Commission\"");
    }

    #[test]
    fn empty_patch_detected() {
        assert!(ReportPatch::default().is_empty());
        let patch = ReportPatch {
            follow_up_required: Some(true),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
