use super::path_id;
use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::state::AppState;
use api_shared::{ApiResponse, ErrorResponse};
use axum::{
    body::Bytes,
    extract::{
        multipart::{Multipart, MultipartRejection},
        Path, State,
    },
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    Json,
};
use survey_core::{SurveyError, Upload};
use survey_files::AttachmentMetadata;
use utoipa::ToSchema;

/// Multipart field carrying the file.
pub const FILE_FIELD: &str = "file";

/// Room for multipart framing on top of the largest accepted file.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Multipart form accepted by the upload endpoint.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

struct ReceivedFile {
    filename: Option<String>,
    media_type: String,
    bytes: Bytes,
}

async fn read_file_field(multipart: &mut Multipart) -> Result<ReceivedFile, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_owned);
        let media_type = field
            .content_type()
            .unwrap_or(FALLBACK_MEDIA_TYPE)
            .to_owned();
        let bytes = field.bytes().await?;
        return Ok(ReceivedFile {
            filename,
            media_type,
            bytes,
        });
    }
    Err(SurveyError::invalid_field(FILE_FIELD, "a multipart field named 'file' is required").into())
}

#[utoipa::path(
    post,
    path = "/api/reports/{id}/attachments",
    tag = "attachments",
    params(("id" = String, Path, description = "Report id")),
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Attachment stored", body = AttachmentMetadata),
        (status = 400, description = "Missing file, empty file or media type not accepted", body = ErrorResponse),
        (status = 403, description = "Role may not upload", body = ErrorResponse),
        (status = 404, description = "Report not found", body = ErrorResponse),
        (status = 409, description = "Identical file already attached", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    )
)]
pub async fn upload_attachment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<AttachmentMetadata>>, ApiError> {
    let report_id = path_id("report", &id)?;
    let mut multipart = multipart?;
    let file = read_file_field(&mut multipart).await?;

    let metadata = state.attachments.upload(
        user.actor,
        &report_id,
        Upload {
            original_filename: file.filename.as_deref(),
            media_type: &file.media_type,
            bytes: &file.bytes,
        },
    )?;
    Ok(Json(ApiResponse::with_message(metadata, "Attachment uploaded")))
}

#[utoipa::path(
    get,
    path = "/api/reports/{id}/attachments",
    tag = "attachments",
    params(("id" = String, Path, description = "Report id")),
    responses(
        (status = 200, description = "Attachments in upload order", body = [AttachmentMetadata]),
        (status = 404, description = "Report not found", body = ErrorResponse)
    )
)]
pub async fn list_attachments(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<AttachmentMetadata>>>, ApiError> {
    let report_id = path_id("report", &id)?;
    Ok(Json(ApiResponse::ok(state.attachments.list(&report_id)?)))
}

#[utoipa::path(
    get,
    path = "/api/reports/{id}/attachments/{attachment_id}",
    tag = "attachments",
    params(
        ("id" = String, Path, description = "Report id"),
        ("attachment_id" = String, Path, description = "Attachment id")
    ),
    responses(
        (status = 200, description = "Raw file bytes with the declared media type"),
        (status = 404, description = "Report or attachment not found", body = ErrorResponse)
    )
)]
pub async fn download_attachment(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((id, attachment_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let report_id = path_id("report", &id)?;
    let attachment_id = path_id("attachment", &attachment_id)?;
    let (metadata, bytes) = state.attachments.download(&report_id, &attachment_id)?;

    let filename: String = metadata
        .original_filename
        .as_str()
        .chars()
        .filter(|c| (c.is_ascii_graphic() || *c == ' ') && *c != '"' && *c != '\\')
        .collect();
    let disposition = format!("attachment; filename=\"{filename}\"");

    Ok((
        [
            (CONTENT_TYPE, metadata.declared_media_type),
            (CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
