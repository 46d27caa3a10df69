use api_shared::JwtService;
use std::sync::Arc;
use survey_core::{AttachmentService, CoreConfig, ReportService, ReportStore, UserStore};
use survey_files::AttachmentStore;

/// Application state for the REST API server
///
/// Every service is cheap to clone; handlers receive their own copy per request.
#[derive(Clone)]
pub struct AppState {
    pub reports: ReportService,
    pub attachments: AttachmentService,
    pub users: Arc<UserStore>,
    pub jwt: JwtService,
}

impl AppState {
    pub fn new(
        cfg: Arc<CoreConfig>,
        store: Arc<dyn ReportStore>,
        files: Arc<AttachmentStore>,
        users: Arc<UserStore>,
        jwt: JwtService,
    ) -> Self {
        Self {
            reports: ReportService::new(cfg, store.clone()),
            attachments: AttachmentService::new(store, files),
            users,
            jwt,
        }
    }
}
