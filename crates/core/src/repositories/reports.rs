//! Report Mutation Pipeline and read access.
//!
//! ## Write ordering
//!
//! Every change to an existing report runs the same steps inside one
//! [`ReportStore::update_with`] call, so they are atomic with respect to other writers:
//!
//! 1. look up the report (`NotFound`);
//! 2. status policy against the *current* status (`Forbidden`); a stale version is attached
//!    to the denial rather than hidden by it;
//! 3. version compare-and-swap (`Conflict`);
//! 4. apply the change, set `updatedAt`, bump `version` by one.
//!
//! Creation checks the create role, then scans for a report with the same facility, survey type
//! and survey year under the same write lock as the insert.

use crate::config::CoreConfig;
use crate::error::{ConflictKind, Operation, SurveyError, SurveyResult, VersionMismatch};
use crate::model::{Actor, NewDeficiency, NewReport, Report, ReportPatch, ReportStatus};
use crate::notification::NotificationService;
use crate::policy;
use crate::query::{format_report, ReportQuery, ReportRepresentation};
use crate::store::ReportStore;
use chrono::{Datelike, TimeDelta, Utc};
use std::sync::Arc;
use survey_types::{ComplianceScore, NonEmptyText};
use survey_uuid::RecordId;

// ============================================================================
// REPORT SERVICE
// ============================================================================

/// Service for creating, reading and mutating survey reports.
#[derive(Clone)]
pub struct ReportService {
    cfg: Arc<CoreConfig>,
    store: Arc<dyn ReportStore>,
    notifier: Arc<NotificationService>,
}

impl ReportService {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<dyn ReportStore>) -> Self {
        let notifier = Arc::new(NotificationService::new(&cfg));
        Self {
            cfg,
            store,
            notifier,
        }
    }

    /// Creates a report for `actor`.
    ///
    /// The new report starts at version 1 with status `compliant`, score 0 and no deficiencies
    /// or notes. A "report created" notification is dispatched in the background afterwards.
    ///
    /// # Errors
    ///
    /// - `SurveyError::Forbidden` if the actor's role may not create reports.
    /// - `SurveyError::Conflict` if a report already exists for the same facility, survey type
    ///   and calendar year of the survey date.
    pub fn create(&self, actor: Actor, input: NewReport) -> SurveyResult<Report> {
        policy::authorize_operation(actor.role, Operation::Create)?;

        let now = Utc::now();
        let survey_year = input.survey_date.year();
        let facility_id = input.facility_id.clone();
        let survey_type = input.survey_type;
        let corrective_action_due = match input.corrective_action_due {
            Some(due) => due,
            None => TimeDelta::try_days(self.cfg.corrective_action_days())
                .and_then(|days| now.checked_add_signed(days))
                .ok_or_else(|| {
                    SurveyError::Internal("corrective-action due date out of range".into())
                })?,
        };

        let report = Report {
            id: RecordId::new(),
            facility_id: input.facility_id,
            survey_type: input.survey_type,
            survey_date: input.survey_date,
            lead_surveyor: input.lead_surveyor,
            survey_scope: input.survey_scope,
            compliance_score: ComplianceScore::default(),
            status: ReportStatus::Compliant,
            accreditation_body: input.accreditation_body,
            deficiencies: Vec::new(),
            corrective_action_due,
            follow_up_required: input.follow_up_required.unwrap_or(false),
            surveyor_notes: Vec::new(),
            created_by: actor.id,
            created_at: now,
            updated_at: now,
            version: 1,
        };

        let created = self.store.insert_guarded(report, &|existing| {
            let duplicate = existing.facility_id == facility_id
                && existing.survey_type == survey_type
                && existing.survey_date.year() == survey_year;
            if duplicate {
                return Err(SurveyError::Conflict(ConflictKind::DuplicateSurvey {
                    facility_id: facility_id.to_string(),
                    survey_type,
                    survey_year,
                    existing_report_id: existing.id,
                }));
            }
            Ok(())
        })?;

        tracing::info!(
            report_id = %created.id,
            facility_id = %created.facility_id,
            survey_type = created.survey_type.as_str(),
            created_by = %actor.id,
            "report created"
        );
        self.notifier
            .dispatch_report_created(created.clone(), actor.id);

        Ok(created)
    }

    /// # Errors
    ///
    /// Returns `SurveyError::NotFound` if no report has this id.
    pub fn get(&self, id: &RecordId) -> SurveyResult<Report> {
        self.store
            .find(id)
            .ok_or_else(|| SurveyError::report_not_found(id))
    }

    /// Reads one report and formats it according to `query`.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::NotFound` if no report has this id.
    pub fn query(&self, id: &RecordId, query: &ReportQuery) -> SurveyResult<ReportRepresentation> {
        let report = self.get(id)?;
        Ok(format_report(&report, query, Utc::now()))
    }

    /// Lists reports in creation order, optionally for a single facility.
    pub fn list(&self, facility_id: Option<&str>) -> Vec<Report> {
        match facility_id {
            Some(facility_id) => self.store.find_by_facility(facility_id),
            None => self.store.find_all(),
        }
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// - `SurveyError::Validation` if the patch sets nothing.
    /// - `SurveyError::NotFound`, `SurveyError::Forbidden` or `SurveyError::Conflict` from the
    ///   write pipeline (see module docs).
    pub fn update(
        &self,
        actor: Actor,
        id: &RecordId,
        patch: ReportPatch,
        expected_version: u64,
    ) -> SurveyResult<Report> {
        if patch.is_empty() {
            return Err(SurveyError::invalid_field(
                "body",
                "at least one updatable field is required",
            ));
        }
        self.mutate(actor, id, expected_version, "report updated", |report| {
            patch.apply_to(report)
        })
    }

    /// Appends a deficiency with a server-generated id.
    ///
    /// # Errors
    ///
    /// Same as [`Self::update`], minus the empty-patch check.
    pub fn append_deficiency(
        &self,
        actor: Actor,
        id: &RecordId,
        deficiency: NewDeficiency,
        expected_version: u64,
    ) -> SurveyResult<Report> {
        let deficiency = deficiency.into_deficiency();
        self.mutate(actor, id, expected_version, "deficiency appended", |report| {
            report.deficiencies.push(deficiency.clone())
        })
    }

    /// Appends a surveyor note.
    ///
    /// # Errors
    ///
    /// Same as [`Self::update`], minus the empty-patch check.
    pub fn add_note(
        &self,
        actor: Actor,
        id: &RecordId,
        note: NonEmptyText,
        expected_version: u64,
    ) -> SurveyResult<Report> {
        self.mutate(actor, id, expected_version, "surveyor note added", |report| {
            report.surveyor_notes.push(note.clone())
        })
    }

    fn mutate(
        &self,
        actor: Actor,
        id: &RecordId,
        expected_version: u64,
        event: &'static str,
        change: impl Fn(&mut Report),
    ) -> SurveyResult<Report> {
        let now = Utc::now();

        let result = self.store.update_with(id, &mut |current| {
            let stale = (current.version != expected_version).then(|| VersionMismatch {
                report_id: current.id,
                expected_version,
                current_version: current.version,
            });

            policy::authorize_edit(actor.role, current.status, stale.clone())?;
            if let Some(mismatch) = stale {
                return Err(SurveyError::Conflict(ConflictKind::VersionMismatch(mismatch)));
            }

            let mut next = current.clone();
            change(&mut next);
            next.updated_at = now;
            next.version = current.version + 1;
            Ok(next)
        });

        match &result {
            Ok(report) => tracing::info!(
                report_id = %report.id,
                version = report.version,
                actor_id = %actor.id,
                role = actor.role.as_str(),
                "{event}"
            ),
            Err(e) => tracing::debug!(report_id = %id, actor_id = %actor.id, "write rejected: {e}"),
        }
        result
    }
}
