//! Summary projection of a report: risk, metrics and required actions.

use crate::constants::{MAX_CRITICAL_ISSUES, MEDIUM_RISK_MAJOR_THRESHOLD};
use crate::model::{Report, ReportStatus, Severity, SurveyType};
use chrono::{DateTime, Utc};
use serde::Serialize;
use survey_types::{ComplianceScore, NonEmptyText};
use survey_uuid::RecordId;
use utoipa::ToSchema;

const MILLIS_PER_DAY: i64 = 86_400_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeyMetrics {
    pub total_deficiencies: usize,
    pub immediate_jeopardy_count: usize,
    pub major_deficiencies: usize,
    pub minor_deficiencies: usize,
    pub overdue_tasks: usize,
    #[schema(value_type = u8)]
    pub compliance_rate: ComplianceScore,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequired {
    pub corrective_action_due: DateTime<Utc>,
    pub follow_up_required: bool,
    /// Whole days until the corrective action is due, rounded up. Negative once overdue.
    pub estimated_resolution_days: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    #[schema(value_type = String)]
    pub id: RecordId,
    #[schema(value_type = String)]
    pub facility_id: NonEmptyText,
    pub survey_type: SurveyType,
    pub survey_date: DateTime<Utc>,
    pub status: ReportStatus,
    #[schema(value_type = u8)]
    pub compliance_score: ComplianceScore,
    pub risk_level: RiskLevel,
    pub key_metrics: KeyMetrics,
    pub critical_issues: Vec<String>,
    pub action_required: ActionRequired,
    pub executive_summary: String,
}

/// Builds the summary projection. `now` anchors the overdue and days-remaining figures.
pub fn build_summary(report: &Report, now: DateTime<Utc>) -> ReportSummary {
    let count = |severity: Severity| {
        report
            .deficiencies
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    };

    let total = report.deficiencies.len();
    let immediate_jeopardy = count(Severity::ImmediateJeopardy);
    let major = count(Severity::Major);
    let overdue = report
        .deficiencies
        .iter()
        .filter(|d| d.due_date.is_some_and(|due| due < now))
        .count();

    let risk_level = if immediate_jeopardy > 0 {
        RiskLevel::High
    } else if major > MEDIUM_RISK_MAJOR_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let critical_issues = report
        .deficiencies
        .iter()
        .filter(|d| matches!(d.severity, Severity::ImmediateJeopardy | Severity::Major))
        .take(MAX_CRITICAL_ISSUES)
        .map(|d| d.description.to_string())
        .collect();

    let estimated_resolution_days = report.follow_up_required.then(|| {
        let millis = (report.corrective_action_due - now).num_milliseconds();
        (millis + MILLIS_PER_DAY - 1).div_euclid(MILLIS_PER_DAY)
    });

    let key_metrics = KeyMetrics {
        total_deficiencies: total,
        immediate_jeopardy_count: immediate_jeopardy,
        major_deficiencies: major,
        minor_deficiencies: total - immediate_jeopardy - major,
        overdue_tasks: overdue,
        compliance_rate: report.compliance_score,
    };

    ReportSummary {
        id: report.id,
        facility_id: report.facility_id.clone(),
        survey_type: report.survey_type,
        survey_date: report.survey_date,
        status: report.status,
        compliance_score: report.compliance_score,
        risk_level,
        executive_summary: executive_summary(&key_metrics, report.follow_up_required),
        key_metrics,
        critical_issues,
        action_required: ActionRequired {
            corrective_action_due: report.corrective_action_due,
            follow_up_required: report.follow_up_required,
            estimated_resolution_days,
        },
    }
}

fn executive_summary(metrics: &KeyMetrics, follow_up_required: bool) -> String {
    let score = metrics.compliance_rate.value();
    if metrics.immediate_jeopardy_count > 0 {
        return format!(
            "URGENT: {} immediate jeopardy deficiencies identified requiring immediate attention. \
             Total of {} deficiencies found with a compliance score of {}%.",
            metrics.immediate_jeopardy_count, metrics.total_deficiencies, score
        );
    }
    let follow_up = if follow_up_required {
        "Follow-up required."
    } else {
        "No follow-up required."
    };
    format!(
        "Survey completed with {} deficiencies ({} major). Compliance score: {}%. {}",
        metrics.total_deficiencies, metrics.major_deficiencies, score, follow_up
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{deficiency, sample_report};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn immediate_jeopardy_is_always_high_risk() {
        let mut report = sample_report("FAC-1");
        report.deficiencies = vec![deficiency("A", Severity::ImmediateJeopardy, None)];
        assert_eq!(build_summary(&report, now()).risk_level, RiskLevel::High);

        report.deficiencies.extend([
            deficiency("B", Severity::Major, None),
            deficiency("C", Severity::Major, None),
            deficiency("D", Severity::Major, None),
        ]);
        let summary = build_summary(&report, now());
        assert_eq!(summary.key_metrics.major_deficiencies, 3);
        assert_eq!(summary.risk_level, RiskLevel::High);
    }

    #[test]
    fn more_than_two_majors_is_medium() {
        let mut report = sample_report("FAC-1");
        report.deficiencies = vec![
            deficiency("A", Severity::Major, None),
            deficiency("B", Severity::Major, None),
        ];
        assert_eq!(build_summary(&report, now()).risk_level, RiskLevel::Low);

        report
            .deficiencies
            .push(deficiency("C", Severity::Major, None));
        assert_eq!(build_summary(&report, now()).risk_level, RiskLevel::Medium);
    }

    #[test]
    fn metrics_count_by_severity_and_overdue() {
        let mut report = sample_report("FAC-1");
        report.deficiencies = vec![
            deficiency("A", Severity::Minor, Some(now() - Duration::days(1))),
            deficiency("B", Severity::Major, Some(now() + Duration::days(1))),
            deficiency("C", Severity::ImmediateJeopardy, Some(now())),
            deficiency("D", Severity::Minor, None),
        ];

        let metrics = build_summary(&report, now()).key_metrics;
        assert_eq!(metrics.total_deficiencies, 4);
        assert_eq!(metrics.immediate_jeopardy_count, 1);
        assert_eq!(metrics.major_deficiencies, 1);
        assert_eq!(metrics.minor_deficiencies, 2);
        // Due exactly now is not overdue.
        assert_eq!(metrics.overdue_tasks, 1);
        assert_eq!(metrics.compliance_rate, report.compliance_score);
    }

    #[test]
    fn critical_issues_keep_first_three_in_order() {
        let mut report = sample_report("FAC-1");
        report.deficiencies = vec![
            deficiency("A", Severity::Minor, None),
            deficiency("B", Severity::Major, None),
            deficiency("C", Severity::ImmediateJeopardy, None),
            deficiency("D", Severity::Major, None),
            deficiency("E", Severity::Major, None),
        ];

        let summary = build_summary(&report, now());
        assert_eq!(
            summary.critical_issues,
            ["B description", "C description", "D description"]
        );
    }

    #[test]
    fn resolution_days_only_with_follow_up() {
        let mut report = sample_report("FAC-1");
        report.corrective_action_due = now() + Duration::hours(36);

        report.follow_up_required = false;
        let summary = build_summary(&report, now());
        assert_eq!(summary.action_required.estimated_resolution_days, None);

        report.follow_up_required = true;
        let summary = build_summary(&report, now());
        assert_eq!(summary.action_required.estimated_resolution_days, Some(2));

        report.corrective_action_due = now() - Duration::hours(36);
        let summary = build_summary(&report, now());
        assert_eq!(summary.action_required.estimated_resolution_days, Some(-1));
    }

    #[test]
    fn executive_summary_wording() {
        let mut report = sample_report("FAC-1");
        report.compliance_score = ComplianceScore::new(72).unwrap();
        report.follow_up_required = true;
        report.deficiencies = vec![
            deficiency("A", Severity::Major, None),
            deficiency("B", Severity::Minor, None),
        ];
        assert_eq!(
            build_summary(&report, now()).executive_summary,
            "Survey completed with 2 deficiencies (1 major). Compliance score: 72%. Follow-up required."
        );

        report
            .deficiencies
            .push(deficiency("C", Severity::ImmediateJeopardy, None));
        let text = build_summary(&report, now()).executive_summary;
        assert!(text.starts_with("URGENT: 1 immediate jeopardy"));
        assert!(text.contains("Total of 3 deficiencies"));
        assert!(text.ends_with("compliance score of 72%."));
    }

    #[test]
    fn null_resolution_days_serialise_as_null() {
        let report = sample_report("FAC-1");
        let json = serde_json::to_value(build_summary(&report, now())).unwrap();
        assert!(json["actionRequired"]["estimatedResolutionDays"].is_null());
        assert_eq!(json["riskLevel"], "low");
    }
}
