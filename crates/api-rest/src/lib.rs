//! # API REST
//!
//! REST API implementation for survey reports.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, multipart uploads, CORS, request ids)
//!
//! Uses `api-shared` for the response envelope, error mapping and token resolution.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;


use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware,
    routing::{get, post},
    Router,
};
use handlers::attachments::MULTIPART_OVERHEAD_BYTES;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use error::ApiError;
pub use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::auth::login,
        handlers::reports::list_reports,
        handlers::reports::create_report,
        handlers::reports::get_report,
        handlers::reports::update_report,
        handlers::reports::append_deficiency,
        handlers::reports::add_note,
        handlers::attachments::upload_attachment,
        handlers::attachments::list_attachments,
        handlers::attachments::download_attachment,
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::ErrorResponse,
        api_shared::ErrorBody,
        api_shared::ErrorCode,
        handlers::auth::LoginRequest,
        handlers::auth::LoginResponse,
        handlers::attachments::UploadForm,
        survey_core::UserProfile,
        survey_core::Role,
        survey_core::Report,
        survey_core::Deficiency,
        survey_core::SurveyType,
        survey_core::ReportStatus,
        survey_core::AccreditationBody,
        survey_core::Severity,
        survey_core::FieldIssue,
        survey_core::ReportRepresentation,
        survey_core::query::SelectedReport,
        survey_core::query::DeficiencySelection,
        survey_core::query::DeficiencyPage,
        survey_core::query::Pagination,
        survey_core::summary::ReportSummary,
        survey_core::summary::KeyMetrics,
        survey_core::summary::ActionRequired,
        survey_core::summary::RiskLevel,
        survey_core::validation::CreateReportRequest,
        survey_core::validation::UpdateReportRequest,
        survey_core::validation::AppendDeficiencyRequest,
        survey_core::validation::AddNoteRequest,
        survey_files::AttachmentMetadata,
    )),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Login and bearer tokens"),
        (name = "reports", description = "Accreditation survey reports"),
        (name = "attachments", description = "Files attached to a report")
    ),
    info(
        title = "Survey Report API",
        version = "0.1.0",
        description = "Hospital accreditation survey reports with role- and status-based editing and optimistic concurrency. Every endpoint except health and login needs `Authorization: Bearer <token>`."
    )
)]
pub struct ApiDoc;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let upload_limit = usize::try_from(
        state
            .attachments
            .max_upload_bytes()
            .saturating_add(MULTIPART_OVERHEAD_BYTES),
    )
    .unwrap_or(usize::MAX);

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/reports",
            get(handlers::reports::list_reports).post(handlers::reports::create_report),
        )
        .route(
            "/api/reports/:id",
            get(handlers::reports::get_report).put(handlers::reports::update_report),
        )
        .route(
            "/api/reports/:id/deficiencies",
            post(handlers::reports::append_deficiency),
        )
        .route("/api/reports/:id/notes", post(handlers::reports::add_note))
        .route(
            "/api/reports/:id/attachments",
            post(handlers::attachments::upload_attachment)
                .layer(DefaultBodyLimit::max(upload_limit))
                .get(handlers::attachments::list_attachments),
        )
        .route(
            "/api/reports/:id/attachments/:attachment_id",
            get(handlers::attachments::download_attachment),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(handlers::not_found)
        .layer(middleware::from_fn(error::stamp_request_id))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            tracing::info_span!(
                "http",
                method = %request.method(),
                uri = %request.uri(),
                request_id,
            )
        }))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
