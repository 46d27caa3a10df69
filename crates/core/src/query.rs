//! Report query and formatting engine.
//!
//! A stored [`Report`] plus a parsed [`ReportQuery`] produce exactly one of three shapes,
//! decided in this order:
//!
//! 1. `view=summary` produces a [`ReportSummary`]; `include` is ignored.
//! 2. `include=...` produces a [`SelectedReport`] holding `id` plus the requested fields.
//! 3. Otherwise the full report is returned unchanged.
//!
//! When `deficiencies` is selected it is filtered by severity, sorted, then sliced to the
//! requested page. The slice is wrapped in a pagination envelope only when the caller supplied
//! `page` or `limit` explicitly; otherwise the bare list is returned.

use crate::constants::{DEFAULT_PAGE_LIMIT, INCLUDE_BASIC, MAX_PAGE_LIMIT};
use crate::error::{FieldIssue, SurveyError, SurveyResult};
use crate::model::{
    AccreditationBody, Deficiency, Report, ReportStatus, Severity, SurveyType,
};
use crate::summary::{build_summary, ReportSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use survey_types::{ComplianceScore, NonEmptyText};
use survey_uuid::RecordId;
use utoipa::{IntoParams, ToSchema};

// ============================================================================
// RAW PARAMETERS
// ============================================================================

/// Query-string parameters exactly as received. Parsed by [`ReportQuery::parse`].
#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQueryParams {
    /// `default` or `summary`
    pub view: Option<String>,
    /// Comma-separated field names, or `basic`
    pub include: Option<String>,
    /// Deficiency page, starting at 1
    pub page: Option<String>,
    /// Deficiencies per page, 1..=100
    pub limit: Option<String>,
    #[serde(rename = "deficiencies.severity")]
    pub severity: Option<String>,
    /// `dueDate`, `severity` or `standardCode`
    #[serde(rename = "deficiencies.sortBy")]
    pub sort_by: Option<String>,
    /// `asc` or `desc`
    #[serde(rename = "deficiencies.order")]
    pub order: Option<String>,
}

// ============================================================================
// PARSED QUERY
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewKind {
    #[default]
    Default,
    Summary,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeficiencySort {
    DueDate,
    #[default]
    Severity,
    StandardCode,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Closed table of report attributes selectable through `include`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IncludeField {
    FacilityId,
    SurveyType,
    SurveyDate,
    LeadSurveyor,
    SurveyScope,
    ComplianceScore,
    Status,
    AccreditationBody,
    Deficiencies,
    CorrectiveActionDue,
    FollowUpRequired,
    SurveyorNotes,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
    Version,
}

impl IncludeField {
    const TABLE: &'static [(&'static str, IncludeField)] = &[
        ("facilityId", IncludeField::FacilityId),
        ("surveyType", IncludeField::SurveyType),
        ("surveyDate", IncludeField::SurveyDate),
        ("leadSurveyor", IncludeField::LeadSurveyor),
        ("surveyScope", IncludeField::SurveyScope),
        ("complianceScore", IncludeField::ComplianceScore),
        ("status", IncludeField::Status),
        ("accreditationBody", IncludeField::AccreditationBody),
        ("deficiencies", IncludeField::Deficiencies),
        ("correctiveActionDue", IncludeField::CorrectiveActionDue),
        ("followUpRequired", IncludeField::FollowUpRequired),
        ("surveyorNotes", IncludeField::SurveyorNotes),
        ("createdBy", IncludeField::CreatedBy),
        ("createdAt", IncludeField::CreatedAt),
        ("updatedAt", IncludeField::UpdatedAt),
        ("version", IncludeField::Version),
    ];

    /// The fixed subset selected by `include=basic`.
    pub const BASIC: [IncludeField; 5] = [
        IncludeField::FacilityId,
        IncludeField::SurveyType,
        IncludeField::ComplianceScore,
        IncludeField::Status,
        IncludeField::SurveyDate,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::TABLE
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, field)| *field)
    }
}

/// Field selection requested through `include`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inclusion {
    Basic,
    Fields(Vec<IncludeField>),
}

impl Inclusion {
    /// Parses a comma-separated list. `basic` anywhere wins; unknown names are dropped.
    pub fn parse(raw: &str) -> Self {
        let names: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect();

        if names.contains(&INCLUDE_BASIC) {
            return Inclusion::Basic;
        }

        let mut fields = Vec::new();
        for field in names.into_iter().filter_map(IncludeField::from_name) {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        Inclusion::Fields(fields)
    }

    pub fn fields(&self) -> &[IncludeField] {
        match self {
            Inclusion::Basic => &IncludeField::BASIC,
            Inclusion::Fields(fields) => fields,
        }
    }
}

/// Filter, sort and page settings for the deficiency sub-collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeficiencyQuery {
    pub severity: Option<Severity>,
    pub sort_by: DeficiencySort,
    pub order: SortOrder,
    pub page: u32,
    pub limit: u32,
    /// True when `page` or `limit` was supplied, which selects the envelope output.
    pub paginate: bool,
}

impl Default for DeficiencyQuery {
    fn default() -> Self {
        Self {
            severity: None,
            sort_by: DeficiencySort::default(),
            order: SortOrder::default(),
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            paginate: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportQuery {
    pub view: ViewKind,
    pub include: Option<Inclusion>,
    pub deficiencies: DeficiencyQuery,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ReportQuery {
    /// Validates raw parameters, collecting every problem before failing.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::Validation` listing each invalid parameter.
    pub fn parse(params: &ReportQueryParams) -> SurveyResult<Self> {
        let mut issues = Vec::new();
        let mut query = ReportQuery::default();

        if let Some(view) = present(&params.view) {
            match view {
                "default" => query.view = ViewKind::Default,
                "summary" => query.view = ViewKind::Summary,
                _ => issues.push(FieldIssue::new("view", "must be one of [default, summary]")),
            }
        }

        query.include = present(&params.include).map(Inclusion::parse);

        let defs = &mut query.deficiencies;
        if let Some(page) = present(&params.page) {
            defs.paginate = true;
            match page.parse::<u32>() {
                Ok(p) if p >= 1 => defs.page = p,
                _ => issues.push(FieldIssue::new("page", "must be an integer >= 1")),
            }
        }
        if let Some(limit) = present(&params.limit) {
            defs.paginate = true;
            match limit.parse::<u32>() {
                Ok(l) if (1..=MAX_PAGE_LIMIT).contains(&l) => defs.limit = l,
                _ => issues.push(FieldIssue::new(
                    "limit",
                    format!("must be an integer between 1 and {MAX_PAGE_LIMIT}"),
                )),
            }
        }
        if let Some(severity) = present(&params.severity) {
            match severity.parse::<Severity>() {
                Ok(s) => defs.severity = Some(s),
                Err(e) => issues.push(FieldIssue::new("deficiencies.severity", e.to_string())),
            }
        }
        if let Some(sort_by) = present(&params.sort_by) {
            match sort_by {
                "dueDate" => defs.sort_by = DeficiencySort::DueDate,
                "severity" => defs.sort_by = DeficiencySort::Severity,
                "standardCode" => defs.sort_by = DeficiencySort::StandardCode,
                _ => issues.push(FieldIssue::new(
                    "deficiencies.sortBy",
                    "must be one of [dueDate, severity, standardCode]",
                )),
            }
        }
        if let Some(order) = present(&params.order) {
            match order {
                "asc" => defs.order = SortOrder::Asc,
                "desc" => defs.order = SortOrder::Desc,
                _ => issues.push(FieldIssue::new(
                    "deficiencies.order",
                    "must be one of [asc, desc]",
                )),
            }
        }

        if issues.is_empty() {
            Ok(query)
        } else {
            Err(SurveyError::validation(issues))
        }
    }
}

// ============================================================================
// OUTPUT SHAPES
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u32,
    pub items_per_page: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeficiencyPage {
    pub items: Vec<Deficiency>,
    pub pagination: Pagination,
}

/// Processed deficiency sub-collection: enveloped when paging was requested, bare otherwise.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum DeficiencySelection {
    Paged(DeficiencyPage),
    List(Vec<Deficiency>),
}

/// Include shape: `id` plus whichever fields were requested.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectedReport {
    #[schema(value_type = String)]
    pub id: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub facility_id: Option<NonEmptyText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survey_type: Option<SurveyType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survey_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub lead_surveyor: Option<NonEmptyText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<String>>)]
    pub survey_scope: Option<Vec<NonEmptyText>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<u8>)]
    pub compliance_score: Option<ComplianceScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReportStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accreditation_body: Option<AccreditationBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deficiencies: Option<DeficiencySelection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrective_action_due: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<String>>)]
    pub surveyor_notes: Option<Vec<NonEmptyText>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub created_by: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

impl SelectedReport {
    fn empty(id: RecordId) -> Self {
        Self {
            id,
            facility_id: None,
            survey_type: None,
            survey_date: None,
            lead_surveyor: None,
            survey_scope: None,
            compliance_score: None,
            status: None,
            accreditation_body: None,
            deficiencies: None,
            corrective_action_due: None,
            follow_up_required: None,
            surveyor_notes: None,
            created_by: None,
            created_at: None,
            updated_at: None,
            version: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum ReportRepresentation {
    Full(Box<Report>),
    Summary(Box<ReportSummary>),
    Selected(Box<SelectedReport>),
}

// ============================================================================
// ENGINE
// ============================================================================

/// Formats one report snapshot according to `query`.
///
/// `now` anchors the time-relative summary metrics.
pub fn format_report(
    report: &Report,
    query: &ReportQuery,
    now: DateTime<Utc>,
) -> ReportRepresentation {
    if query.view == ViewKind::Summary {
        return ReportRepresentation::Summary(Box::new(build_summary(report, now)));
    }
    match &query.include {
        Some(inclusion) => ReportRepresentation::Selected(Box::new(select_fields(
            report,
            inclusion,
            &query.deficiencies,
        ))),
        None => ReportRepresentation::Full(Box::new(report.clone())),
    }
}

fn select_fields(report: &Report, inclusion: &Inclusion, defs: &DeficiencyQuery) -> SelectedReport {
    let mut out = SelectedReport::empty(report.id);
    for field in inclusion.fields() {
        match field {
            IncludeField::FacilityId => out.facility_id = Some(report.facility_id.clone()),
            IncludeField::SurveyType => out.survey_type = Some(report.survey_type),
            IncludeField::SurveyDate => out.survey_date = Some(report.survey_date),
            IncludeField::LeadSurveyor => out.lead_surveyor = Some(report.lead_surveyor.clone()),
            IncludeField::SurveyScope => out.survey_scope = Some(report.survey_scope.clone()),
            IncludeField::ComplianceScore => out.compliance_score = Some(report.compliance_score),
            IncludeField::Status => out.status = Some(report.status),
            IncludeField::AccreditationBody => {
                out.accreditation_body = Some(report.accreditation_body)
            }
            IncludeField::Deficiencies => {
                out.deficiencies = Some(process_deficiencies(&report.deficiencies, defs))
            }
            IncludeField::CorrectiveActionDue => {
                out.corrective_action_due = Some(report.corrective_action_due)
            }
            IncludeField::FollowUpRequired => {
                out.follow_up_required = Some(report.follow_up_required)
            }
            IncludeField::SurveyorNotes => out.surveyor_notes = Some(report.surveyor_notes.clone()),
            IncludeField::CreatedBy => out.created_by = Some(report.created_by),
            IncludeField::CreatedAt => out.created_at = Some(report.created_at),
            IncludeField::UpdatedAt => out.updated_at = Some(report.updated_at),
            IncludeField::Version => out.version = Some(report.version),
        }
    }
    out
}

/// Base comparison per sort key. Missing due dates sort after every present one.
fn compare(sort_by: DeficiencySort, a: &Deficiency, b: &Deficiency) -> Ordering {
    match sort_by {
        DeficiencySort::DueDate => match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        DeficiencySort::Severity => b.severity.rank().cmp(&a.severity.rank()),
        DeficiencySort::StandardCode => a.standard_code.as_str().cmp(b.standard_code.as_str()),
    }
}

/// Filter, then sort, then slice the deficiency list.
///
/// Without an explicit `page` or `limit` the whole sorted list is returned unsliced. The sort is
/// stable, so equal keys keep their stored order. `order=asc` reverses the base comparison of the
/// chosen key.
pub fn process_deficiencies(deficiencies: &[Deficiency], query: &DeficiencyQuery) -> DeficiencySelection {
    let mut filtered: Vec<&Deficiency> = deficiencies
        .iter()
        .filter(|d| query.severity.map_or(true, |s| d.severity == s))
        .collect();

    filtered.sort_by(|a, b| {
        let ord = compare(query.sort_by, a, b);
        match query.order {
            SortOrder::Desc => ord,
            SortOrder::Asc => ord.reverse(),
        }
    });

    if !query.paginate {
        return DeficiencySelection::List(filtered.into_iter().cloned().collect());
    }

    let total = filtered.len();
    let limit = query.limit.max(1) as usize;
    let start = (query.page.max(1) as usize - 1).saturating_mul(limit);
    let items: Vec<Deficiency> = filtered
        .into_iter()
        .skip(start)
        .take(limit)
        .cloned()
        .collect();

    let total_pages = total.div_ceil(limit) as u32;
    DeficiencySelection::Paged(DeficiencyPage {
        items,
        pagination: Pagination {
            current_page: query.page,
            total_pages,
            total_items: total as u32,
            items_per_page: query.limit,
            has_next: query.page < total_pages,
            has_prev: query.page > 1,
        },
    })
}
