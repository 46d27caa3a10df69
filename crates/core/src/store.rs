//! Report entity store.
//!
//! The store exclusively owns report data. Readers get cloned snapshots; writers go through
//! [`ReportStore::insert_guarded`] and [`ReportStore::update_with`], each of which runs its check
//! and its write under a single write lock so no reader can observe a half-applied change and no
//! two writers can both succeed against the same version.

use crate::error::{SurveyError, SurveyResult};
use crate::model::Report;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use survey_uuid::RecordId;

/// Storage interface consumed by the report services.
pub trait ReportStore: Send + Sync {
    /// Point lookup. Returns a consistent snapshot of one record.
    fn find(&self, id: &RecordId) -> Option<Report>;

    /// All reports in insertion order.
    fn find_all(&self) -> Vec<Report>;

    /// All reports for one facility, in insertion order.
    fn find_by_facility(&self, facility_id: &str) -> Vec<Report>;

    /// Inserts `report` after `guard` has accepted every existing record.
    ///
    /// The scan and the insert happen atomically with respect to other writers.
    fn insert_guarded(
        &self,
        report: Report,
        guard: &dyn Fn(&Report) -> SurveyResult<()>,
    ) -> SurveyResult<Report>;

    /// Replaces the record `id` with the output of `apply`, which sees the current snapshot.
    ///
    /// `apply` must return the same id with `version` exactly one greater than the current
    /// version; any other result is rejected without writing.
    ///
    /// # Errors
    ///
    /// - `SurveyError::NotFound` if no record has this id.
    /// - Whatever `apply` returns, unchanged.
    fn update_with(
        &self,
        id: &RecordId,
        apply: &mut dyn FnMut(&Report) -> SurveyResult<Report>,
    ) -> SurveyResult<Report>;

    /// Inserts without any uniqueness guard.
    fn insert(&self, report: Report) -> SurveyResult<Report> {
        self.insert_guarded(report, &|_| Ok(()))
    }
}

#[derive(Default)]
struct Records {
    by_id: HashMap<RecordId, Report>,
    order: Vec<RecordId>,
}

impl Records {
    fn in_order(&self) -> impl Iterator<Item = &Report> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }
}

/// Hash-map backed store with insertion order preserved for listings.
#[derive(Default)]
pub struct InMemoryReportStore {
    records: RwLock<Records>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Writes are single assignments, so a poisoned lock still guards consistent data.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, Records> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Records> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ReportStore for InMemoryReportStore {
    fn find(&self, id: &RecordId) -> Option<Report> {
        self.read().by_id.get(id).cloned()
    }

    fn find_all(&self) -> Vec<Report> {
        self.read().in_order().cloned().collect()
    }

    fn find_by_facility(&self, facility_id: &str) -> Vec<Report> {
        self.read()
            .in_order()
            .filter(|r| r.facility_id.as_str() == facility_id)
            .cloned()
            .collect()
    }

    fn insert_guarded(
        &self,
        report: Report,
        guard: &dyn Fn(&Report) -> SurveyResult<()>,
    ) -> SurveyResult<Report> {
        let mut records = self.write();

        if records.by_id.contains_key(&report.id) {
            return Err(SurveyError::Internal(format!(
                "report id collision: {}",
                report.id
            )));
        }
        for existing in records.in_order() {
            guard(existing)?;
        }

        records.order.push(report.id);
        records.by_id.insert(report.id, report.clone());
        Ok(report)
    }

    fn update_with(
        &self,
        id: &RecordId,
        apply: &mut dyn FnMut(&Report) -> SurveyResult<Report>,
    ) -> SurveyResult<Report> {
        let mut records = self.write();

        let current = records
            .by_id
            .get(id)
            .ok_or_else(|| SurveyError::report_not_found(id))?;
        let next = apply(current)?;

        if next.id != current.id || next.version != current.version + 1 {
            return Err(SurveyError::Internal(format!(
                "refusing write to report {}: version {} does not follow {}",
                id, next.version, current.version
            )));
        }

        records.by_id.insert(*id, next.clone());
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_report;

    #[test]
    fn insert_and_find_returns_snapshot() {
        let store = InMemoryReportStore::new();
        let report = sample_report("FAC-1");
        store.insert(report.clone()).unwrap();

        let found = store.find(&report.id).unwrap();
        assert_eq!(found, report);
        assert!(store.find(&RecordId::new()).is_none());
    }

    #[test]
    fn find_all_preserves_insertion_order() {
        let store = InMemoryReportStore::new();
        let ids: Vec<_> = (0..5)
            .map(|i| store.insert(sample_report(&format!("FAC-{i}"))).unwrap().id)
            .collect();

        let listed: Vec<_> = store.find_all().into_iter().map(|r| r.id).collect();
        assert_eq!(listed, ids);
    }

    #[test]
    fn find_by_facility_filters() {
        let store = InMemoryReportStore::new();
        store.insert(sample_report("FAC-A")).unwrap();
        store.insert(sample_report("FAC-B")).unwrap();
        store.insert(sample_report("FAC-A")).unwrap();

        assert_eq!(store.find_by_facility("FAC-A").len(), 2);
        assert_eq!(store.find_by_facility("FAC-B").len(), 1);
        assert!(store.find_by_facility("FAC-C").is_empty());
    }

    #[test]
    fn guard_rejection_prevents_insert() {
        let store = InMemoryReportStore::new();
        store.insert(sample_report("FAC-A")).unwrap();

        let result = store.insert_guarded(sample_report("FAC-A"), &|existing| {
            if existing.facility_id.as_str() == "FAC-A" {
                Err(SurveyError::invalid_field("facilityId", "taken"))
            } else {
                Ok(())
            }
        });

        assert!(result.is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn update_with_requires_version_increment() {
        let store = InMemoryReportStore::new();
        let report = store.insert(sample_report("FAC-A")).unwrap();

        let skipped = store.update_with(&report.id, &mut |current| {
            let mut next = current.clone();
            next.version += 2;
            Ok(next)
        });
        assert!(matches!(skipped, Err(SurveyError::Internal(_))));
        assert_eq!(store.find(&report.id).unwrap().version, 1);

        let bumped = store
            .update_with(&report.id, &mut |current| {
                let mut next = current.clone();
                next.version += 1;
                Ok(next)
            })
            .unwrap();
        assert_eq!(bumped.version, 2);
        assert_eq!(store.find(&report.id).unwrap().version, 2);
    }

    #[test]
    fn update_with_unknown_id_is_not_found() {
        let store = InMemoryReportStore::new();
        let result = store.update_with(&RecordId::new(), &mut |current| Ok(current.clone()));
        assert!(matches!(result, Err(SurveyError::NotFound { .. })));
    }

    #[test]
    fn failed_apply_leaves_record_untouched() {
        let store = InMemoryReportStore::new();
        let report = store.insert(sample_report("FAC-A")).unwrap();

        let result = store.update_with(&report.id, &mut |_| {
            Err(SurveyError::invalid_field("version", "stale"))
        });
        assert!(result.is_err());
        assert_eq!(store.find(&report.id).unwrap(), report);
    }
}
