//! Authentication and body extractors for Axum

use crate::error::ApiError;
use crate::state::AppState;
use api_shared::AuthError;
use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use survey_core::Actor;

/// Authenticated caller resolved from `Authorization: Bearer <jwt>`
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub actor: Actor,
    pub username: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .map(|h| h.to_str().map_err(|_| AuthError::MalformedHeader))
            .transpose()?;

        let identity = state.jwt.resolve(header, &state.users)?;
        Ok(Self {
            actor: identity.actor,
            username: identity.username,
        })
    }
}

/// `Json` whose rejections render as `VALIDATION_ERROR` envelopes
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` whose rejections render as `VALIDATION_ERROR` envelopes
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
