//! Response envelope shared by every endpoint.
//!
//! Success: `{ "success": true, "data": ..., "message"?: ... }`
//! Failure: `{ "success": false, "error": { "code", "message", "details"?, "timestamp", "requestId"? } }`

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}

/// Machine-readable failure category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    PayloadTooLarge,
    InternalError,
}

impl ErrorCode {
    /// HTTP status for this code.
    pub fn status(self) -> u16 {
        match self {
            ErrorCode::ValidationError => 400,
            ErrorCode::Unauthorized => 401,
            ErrorCode::Forbidden => 403,
            ErrorCode::NotFound => 404,
            ErrorCode::Conflict => 409,
            ErrorCode::PayloadTooLarge => 413,
            ErrorCode::InternalError => 500,
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                code,
                message: message.into(),
                details,
                timestamp: Utc::now(),
                request_id: None,
            },
        }
    }

    pub fn status(&self) -> u16 {
        self.error.code.status()
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.error.request_id = request_id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialise_screaming_snake_case() {
        let json = serde_json::to_value(ErrorCode::PayloadTooLarge).unwrap();
        assert_eq!(json, "PAYLOAD_TOO_LARGE");
        assert_eq!(ErrorCode::PayloadTooLarge.status(), 413);
    }

    #[test]
    fn failure_envelope_shape() {
        let body = ErrorResponse::new(ErrorCode::NotFound, "report not found: x", None)
            .with_request_id(Some("req-1".into()));
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert_eq!(json["error"]["requestId"], "req-1");
        assert!(json["error"].get("details").is_none());
        assert!(json["error"]["timestamp"].is_string());
    }

    #[test]
    fn success_envelope_omits_missing_message() {
        let json = serde_json::to_value(ApiResponse::ok(5)).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": 5}));

        let json = serde_json::to_value(ApiResponse::with_message(5, "done")).unwrap();
        assert_eq!(json["message"], "done");
    }
}
