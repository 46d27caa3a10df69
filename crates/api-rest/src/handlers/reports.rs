//! Report endpoints.
//!
//! Every handler resolves the caller first, so a missing token is reported before anything about
//! the request itself.

use super::path_id;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery, AuthUser};
use crate::state::AppState;
use api_shared::{ApiResponse, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use survey_core::validation::{
    AddNoteRequest, AppendDeficiencyRequest, CreateReportRequest, UpdateReportRequest,
};
use survey_core::{Report, ReportQuery, ReportQueryParams, ReportRepresentation};
use utoipa::IntoParams;

type Enveloped<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListReportsParams {
    /// Only reports for this facility
    pub facility_id: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/reports",
    tag = "reports",
    params(ListReportsParams),
    responses(
        (status = 200, description = "Reports in creation order", body = [Report]),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
pub async fn list_reports(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(params): ApiQuery<ListReportsParams>,
) -> Enveloped<Vec<Report>> {
    let facility_id = params
        .facility_id
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty());
    Ok(Json(ApiResponse::ok(state.reports.list(facility_id))))
}

#[utoipa::path(
    post,
    path = "/api/reports",
    tag = "reports",
    request_body = CreateReportRequest,
    responses(
        (status = 201, description = "Report created", body = Report),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Role may not create reports", body = ErrorResponse),
        (status = 409, description = "Survey already reported for this facility, type and year", body = ErrorResponse)
    )
)]
pub async fn create_report(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<CreateReportRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Report>>), ApiError> {
    let input = request.validate()?;
    let report = state.reports.create(user.actor, input)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(report, "Report created")),
    ))
}

#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    tag = "reports",
    params(
        ("id" = String, Path, description = "Report id"),
        ReportQueryParams
    ),
    responses(
        (status = 200, description = "Full report, summary, or selected fields", body = ReportRepresentation),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Report not found", body = ErrorResponse)
    )
)]
pub async fn get_report(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
    ApiQuery(params): ApiQuery<ReportQueryParams>,
) -> Enveloped<ReportRepresentation> {
    let id = path_id("report", &id)?;
    let query = ReportQuery::parse(&params)?;
    Ok(Json(ApiResponse::ok(state.reports.query(&id, &query)?)))
}

#[utoipa::path(
    put,
    path = "/api/reports/{id}",
    tag = "reports",
    params(("id" = String, Path, description = "Report id")),
    request_body = UpdateReportRequest,
    responses(
        (status = 200, description = "Updated report", body = Report),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Role may not edit a report in this status", body = ErrorResponse),
        (status = 404, description = "Report not found", body = ErrorResponse),
        (status = 409, description = "Version mismatch", body = ErrorResponse)
    )
)]
pub async fn update_report(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateReportRequest>,
) -> Enveloped<Report> {
    let id = path_id("report", &id)?;
    let (patch, version) = request.validate()?;
    let report = state.reports.update(user.actor, &id, patch, version)?;
    Ok(Json(ApiResponse::with_message(report, "Report updated")))
}

#[utoipa::path(
    post,
    path = "/api/reports/{id}/deficiencies",
    tag = "reports",
    params(("id" = String, Path, description = "Report id")),
    request_body = AppendDeficiencyRequest,
    responses(
        (status = 200, description = "Report with the deficiency appended", body = Report),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Role may not edit a report in this status", body = ErrorResponse),
        (status = 404, description = "Report not found", body = ErrorResponse),
        (status = 409, description = "Version mismatch", body = ErrorResponse)
    )
)]
pub async fn append_deficiency(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<AppendDeficiencyRequest>,
) -> Enveloped<Report> {
    let id = path_id("report", &id)?;
    let (deficiency, version) = request.validate()?;
    let report = state
        .reports
        .append_deficiency(user.actor, &id, deficiency, version)?;
    Ok(Json(ApiResponse::with_message(report, "Deficiency added")))
}

#[utoipa::path(
    post,
    path = "/api/reports/{id}/notes",
    tag = "reports",
    params(("id" = String, Path, description = "Report id")),
    request_body = AddNoteRequest,
    responses(
        (status = 200, description = "Report with the note appended", body = Report),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Role may not edit a report in this status", body = ErrorResponse),
        (status = 404, description = "Report not found", body = ErrorResponse),
        (status = 409, description = "Version mismatch", body = ErrorResponse)
    )
)]
pub async fn add_note(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<AddNoteRequest>,
) -> Enveloped<Report> {
    let id = path_id("report", &id)?;
    let (note, version) = request.validate()?;
    let report = state.reports.add_note(user.actor, &id, note, version)?;
    Ok(Json(ApiResponse::with_message(report, "Note added")))
}
