use api_shared::{ApiResponse, HealthRes, HealthService};
use axum::Json;

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health check response, wrapped in the success envelope", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks. Needs no token.
pub async fn health() -> Json<ApiResponse<HealthRes>> {
    Json(ApiResponse::ok(HealthService::check_health()))
}
