use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;
use api_shared::{ApiResponse, ErrorResponse};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use survey_core::UserProfile;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// HS256 bearer token
    pub token: String,
    pub user: UserProfile,
}

/// Login endpoint
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let user = state
        .users
        .authenticate(&request.username, &request.password)
        .inspect_err(|_| tracing::warn!(username = %request.username, "login failed"))?;
    let token = state.jwt.issue(user.id, user.username.as_str(), user.role)?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "user logged in");
    Ok(Json(ApiResponse::ok(LoginResponse {
        token,
        user: UserProfile::from(&user),
    })))
}
