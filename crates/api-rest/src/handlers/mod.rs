pub mod attachments;
pub mod auth;
pub mod health;
pub mod reports;

use crate::error::ApiError;
use axum::http::Uri;
use survey_core::SurveyError;
use survey_uuid::RecordId;

/// Parses a path id. Ids that cannot exist are reported as missing `resource`.
pub(crate) fn path_id(resource: &'static str, raw: &str) -> Result<RecordId, ApiError> {
    RecordId::parse(raw).map_err(|_| {
        SurveyError::NotFound {
            resource,
            id: raw.to_owned(),
        }
        .into()
    })
}

/// Fallback for unmatched routes.
pub async fn not_found(uri: Uri) -> ApiError {
    SurveyError::NotFound {
        resource: "route",
        id: uri.path().to_owned(),
    }
    .into()
}
