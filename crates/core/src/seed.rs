//! Demo data for local runs.

use crate::error::SurveyResult;
use crate::model::{AccreditationBody, Deficiency, Report, ReportStatus, Role, Severity, SurveyType};
use crate::store::ReportStore;
use crate::users::{UserRecord, UserStore};
use chrono::{Duration, Utc};
use survey_types::{ComplianceScore, NonEmptyText};
use survey_uuid::RecordId;

pub const DEMO_FACILITY_ID: &str = "FAC-DEMO-001";

/// What [`seed_demo_data`] created.
#[derive(Debug)]
pub struct SeededData {
    pub users: Vec<UserRecord>,
    pub report: Report,
}

fn text(value: &str) -> SurveyResult<NonEmptyText> {
    NonEmptyText::new(value).map_err(|e| crate::SurveyError::Internal(e.to_string()))
}

fn finding(
    code: &str,
    description: &str,
    severity: Severity,
    due_in_days: Option<i64>,
) -> SurveyResult<Deficiency> {
    Ok(Deficiency {
        id: RecordId::new(),
        standard_code: text(code)?,
        description: text(description)?,
        severity,
        due_date: due_in_days.map(|days| Utc::now() + Duration::days(days)),
    })
}

/// Registers one user per role and inserts a deficient sample report.
///
/// # Errors
///
/// Fails if a demo username is already registered or the report cannot be stored.
pub fn seed_demo_data(
    users: &UserStore,
    reports: &dyn ReportStore,
    password: &str,
) -> SurveyResult<SeededData> {
    let mut seeded_users = Vec::with_capacity(Role::ALL.len());
    for role in Role::ALL {
        seeded_users.push(users.register(role.as_str(), password, role)?);
    }
    let author = seeded_users
        .iter()
        .find(|u| u.role == Role::Editor)
        .map(|u| u.id)
        .unwrap_or_default();

    let now = Utc::now();
    let report = Report {
        id: RecordId::new(),
        facility_id: text(DEMO_FACILITY_ID)?,
        survey_type: SurveyType::Comprehensive,
        survey_date: now - Duration::days(7),
        lead_surveyor: text("Dr. Morgan Ellis")?,
        survey_scope: vec![
            text("Emergency Department")?,
            text("Pharmacy")?,
            text("Infection Control")?,
        ],
        compliance_score: ComplianceScore::new(78)
            .map_err(|e| crate::SurveyError::Internal(e.to_string()))?,
        status: ReportStatus::Deficient,
        accreditation_body: AccreditationBody::JointCommission,
        deficiencies: vec![
            finding(
                "MM.03.01.01",
                "Medications stored at incorrect temperatures",
                Severity::Major,
                Some(14),
            )?,
            finding(
                "IC.02.01.01",
                "Hand hygiene compliance below threshold",
                Severity::Minor,
                Some(30),
            )?,
            finding(
                "EC.02.03.05",
                "Fire door inspection records incomplete",
                Severity::Major,
                Some(-2),
            )?,
            finding(
                "PC.02.01.03",
                "Patient assessments not documented within required timeframe",
                Severity::Minor,
                None,
            )?,
        ],
        corrective_action_due: now + Duration::days(30),
        follow_up_required: true,
        surveyor_notes: vec![text("Leadership engaged and responsive during exit conference")?],
        created_by: author,
        created_at: now,
        updated_at: now,
        version: 1,
    };
    let report = reports.insert(report)?;

    tracing::info!(
        users = seeded_users.len(),
        report_id = %report.id,
        "seeded demo data"
    );
    Ok(SeededData {
        users: seeded_users,
        report,
    })
}
