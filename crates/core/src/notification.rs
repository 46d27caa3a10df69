//! Post-create notification side channel.
//!
//! Sending is fire-and-forget: the create operation returns before the notification completes,
//! and a failed notification is logged and dropped. It never changes the stored report or the
//! caller's response.

use crate::config::CoreConfig;
use crate::model::Report;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use survey_uuid::RecordId;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NotificationError {
    #[error("notification service unavailable for report {0}")]
    Unavailable(RecordId),
}

/// Simulated external notification service.
#[derive(Clone, Debug)]
pub struct NotificationService {
    failure_rate: f64,
    delay: Duration,
}

impl NotificationService {
    pub fn new(cfg: &CoreConfig) -> Self {
        Self {
            failure_rate: cfg.notification_failure_rate(),
            delay: cfg.notification_delay(),
        }
    }

    /// Sends the "report created" notification.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::Unavailable` with probability `failure_rate`.
    pub async fn notify_report_created(
        &self,
        report: &Report,
        actor_id: &RecordId,
    ) -> Result<(), NotificationError> {
        // Decide before awaiting: ThreadRng is not Send.
        let fails = rand::thread_rng().gen_bool(self.failure_rate);
        tokio::time::sleep(self.delay).await;

        if fails {
            return Err(NotificationError::Unavailable(report.id));
        }
        tracing::info!(
            report_id = %report.id,
            facility_id = %report.facility_id,
            created_by = %actor_id,
            "report creation notification sent"
        );
        Ok(())
    }

    /// Spawns [`Self::notify_report_created`] in the background.
    ///
    /// Returns `None` when called outside a Tokio runtime; the notification is skipped.
    pub fn dispatch_report_created(
        self: &Arc<Self>,
        report: Report,
        actor_id: RecordId,
    ) -> Option<JoinHandle<()>> {
        let Ok(handle) = Handle::try_current() else {
            tracing::warn!(report_id = %report.id, "no async runtime, notification skipped");
            return None;
        };

        let service = Arc::clone(self);
        Some(handle.spawn(async move {
            if let Err(e) = service.notify_report_created(&report, &actor_id).await {
                tracing::warn!(report_id = %report.id, "failed to send notification: {e}");
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_report;

    fn service(failure_rate: f64) -> NotificationService {
        let cfg = CoreConfig::new(failure_rate, Duration::from_millis(5), 30, 1024).unwrap();
        NotificationService::new(&cfg)
    }

    #[tokio::test]
    async fn zero_failure_rate_always_succeeds() {
        let report = sample_report("FAC-1");
        let svc = service(0.0);
        for _ in 0..10 {
            assert!(svc
                .notify_report_created(&report, &report.created_by)
                .await
                .is_ok());
        }
    }

    #[tokio::test]
    async fn full_failure_rate_always_fails() {
        let report = sample_report("FAC-1");
        let err = service(1.0)
            .notify_report_created(&report, &report.created_by)
            .await
            .unwrap_err();
        assert_eq!(err, NotificationError::Unavailable(report.id));
    }

    #[tokio::test]
    async fn dispatched_failure_is_swallowed() {
        let report = sample_report("FAC-1");
        let svc = Arc::new(service(1.0));
        let handle = svc
            .dispatch_report_created(report.clone(), report.created_by)
            .unwrap();
        // The task completes normally even though the send failed.
        assert!(handle.await.is_ok());
    }

    #[test]
    fn dispatch_without_runtime_is_skipped() {
        let report = sample_report("FAC-1");
        let svc = Arc::new(service(0.0));
        assert!(svc
            .dispatch_report_created(report.clone(), report.created_by)
            .is_none());
    }
}
