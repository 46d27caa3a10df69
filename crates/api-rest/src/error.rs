//! HTTP rendering of failures.
//!
//! Handlers return [`ApiError`]; it renders the failure envelope and leaves a copy in the response
//! extensions so [`stamp_request_id`] can add the `x-request-id` of the request that failed.

use api_shared::{auth_error_response, error_response, AuthError, ErrorCode, ErrorResponse};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
        Request,
    },
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use survey_core::SurveyError;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug)]
pub struct ApiError(ErrorResponse);

impl ApiError {
    pub fn body(&self) -> &ErrorResponse {
        &self.0
    }

    fn payload_too_large(message: String) -> Self {
        Self(ErrorResponse::new(ErrorCode::PayloadTooLarge, message, None))
    }
}

impl From<SurveyError> for ApiError {
    fn from(err: SurveyError) -> Self {
        Self(error_response(&err))
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(auth_error_response(&err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::payload_too_large(rejection.body_text());
        }
        SurveyError::invalid_field("body", rejection.body_text()).into()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        SurveyError::invalid_field("query", rejection.body_text()).into()
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        SurveyError::invalid_field("body", rejection.body_text()).into()
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::payload_too_large(err.body_text());
        }
        SurveyError::invalid_field("file", err.body_text()).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(&self.0)).into_response();
        response.extensions_mut().insert(self.0);
        response
    }
}

/// Re-renders failure envelopes with the request's `x-request-id`.
pub async fn stamp_request_id(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let mut response = next.run(request).await;
    let Some(body) = response.extensions_mut().remove::<ErrorResponse>() else {
        return response;
    };

    let status = response.status();
    let mut stamped = (status, Json(body.with_request_id(request_id))).into_response();
    for (name, value) in response.headers() {
        if name != axum::http::header::CONTENT_LENGTH {
            stamped.headers_mut().insert(name.clone(), value.clone());
        }
    }
    stamped
}
