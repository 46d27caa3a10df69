//! Bearer-token identity resolution.
//!
//! Tokens are HS256 JWTs. A request's identity is resolved from the `Authorization` header into
//! an [`Identity`] whose [`Actor`] is all the core ever sees. The subject must still exist in the
//! user directory, and the role is taken from the directory so a role change applies to tokens
//! issued before it.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use survey_core::{Actor, Role, UserStore};
use survey_uuid::RecordId;

/// Shortest secret accepted for signing.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime (one year).
pub const MAX_TTL_HOURS: u64 = 24 * 366;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("authorization header must use the Bearer scheme")]
    MalformedHeader,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
    #[error("token subject no longer exists")]
    UnknownSubject,
    #[error("JWT secret must be at least {MIN_SECRET_LEN} characters")]
    WeakSecret,
    #[error("token lifetime must be between 1 and {MAX_TTL_HOURS} hours")]
    InvalidTtl,
    #[error("failed to encode token: {0}")]
    Encoding(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id, canonical 32-hex form
    pub sub: String,
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Resolved caller of an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub actor: Actor,
    pub username: String,
}

/// JWT service for issuing and validating access tokens
#[derive(Clone)]
pub struct JwtService {
    secret: Arc<String>,
    ttl_hours: u64,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("ttl_hours", &self.ttl_hours)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    /// # Errors
    ///
    /// Returns `AuthError::WeakSecret` if `secret` is shorter than [`MIN_SECRET_LEN`], or
    /// `AuthError::InvalidTtl` if `ttl_hours` is zero or above [`MAX_TTL_HOURS`].
    pub fn new(secret: impl Into<String>, ttl_hours: u64) -> Result<Self, AuthError> {
        let secret = secret.into();
        if secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::WeakSecret);
        }
        if !(1..=MAX_TTL_HOURS).contains(&ttl_hours) {
            return Err(AuthError::InvalidTtl);
        }
        Ok(Self {
            secret: Arc::new(secret),
            ttl_hours,
        })
    }

    pub fn ttl_hours(&self) -> u64 {
        self.ttl_hours
    }

    /// Issues an access token for a user.
    pub fn issue(&self, user_id: RecordId, username: &str, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = i64::try_from(self.ttl_hours)
            .ok()
            .and_then(TimeDelta::try_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or(AuthError::InvalidTtl)?;
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_owned(),
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Encoding(e.to_string()))
    }

    /// Validates signature and expiry and returns the claims.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!("token validation failed: {e}");
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        })
    }

    /// Resolves an `Authorization` header value against the user directory.
    pub fn resolve(&self, authorization: Option<&str>, users: &UserStore) -> Result<Identity, AuthError> {
        let header = authorization.ok_or(AuthError::MissingToken)?;
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MalformedHeader)?;

        let claims = self.validate(token)?;
        let user_id = RecordId::parse(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let user = users.find(&user_id).ok_or(AuthError::UnknownSubject)?;

        Ok(Identity {
            actor: Actor::new(user.id, user.role),
            username: user.username.into_inner(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-characters-long";

    fn service() -> JwtService {
        JwtService::new(SECRET, 24).unwrap()
    }

    #[test]
    fn rejects_short_secret() {
        assert_eq!(JwtService::new("short", 24).unwrap_err(), AuthError::WeakSecret);
    }

    #[test]
    fn rejects_out_of_range_lifetime() {
        assert_eq!(JwtService::new(SECRET, 0).unwrap_err(), AuthError::InvalidTtl);
        assert_eq!(
            JwtService::new(SECRET, MAX_TTL_HOURS + 1).unwrap_err(),
            AuthError::InvalidTtl
        );
        assert_eq!(JwtService::new(SECRET, u64::MAX).unwrap_err(), AuthError::InvalidTtl);

        let svc = JwtService::new(SECRET, MAX_TTL_HOURS).unwrap();
        let token = svc.issue(RecordId::new(), "admin", Role::Admin).unwrap();
        let claims = svc.validate(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, MAX_TTL_HOURS as i64 * 3600);
    }

    #[test]
    fn issue_and_validate() {
        let svc = service();
        let id = RecordId::new();
        let token = svc.issue(id, "editor", Role::Editor).unwrap();

        let claims = svc.validate(&token).unwrap();
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.username, "editor");
        assert_eq!(claims.role, Role::Editor);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = service().issue(RecordId::new(), "a", Role::Admin).unwrap();
        let other = JwtService::new("another-secret-key-that-is-long-enough!!", 24).unwrap();
        assert_eq!(other.validate(&token).unwrap_err(), AuthError::InvalidToken);
    }

    #[test]
    fn expired_token_is_reported() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: RecordId::new().to_string(),
            username: "reader".into(),
            role: Role::Reader,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(service().validate(&token).unwrap_err(), AuthError::TokenExpired);
    }

    #[test]
    fn resolve_uses_directory_role() {
        let svc = service();
        let users = UserStore::new();
        let user = users.register("editor", "pw", Role::Editor).unwrap();

        // Token claims a higher role than the directory holds.
        let token = svc.issue(user.id, "editor", Role::Admin).unwrap();
        let header = format!("Bearer {token}");
        let identity = svc.resolve(Some(&header), &users).unwrap();

        assert_eq!(identity.actor, Actor::new(user.id, Role::Editor));
        assert_eq!(identity.username, "editor");
    }

    #[test]
    fn resolve_failures() {
        let svc = service();
        let users = UserStore::new();

        assert_eq!(svc.resolve(None, &users).unwrap_err(), AuthError::MissingToken);
        assert_eq!(
            svc.resolve(Some("Basic abc"), &users).unwrap_err(),
            AuthError::MalformedHeader
        );
        assert_eq!(
            svc.resolve(Some("Bearer not.a.jwt"), &users).unwrap_err(),
            AuthError::InvalidToken
        );

        let ghost = svc.issue(RecordId::new(), "ghost", Role::Admin).unwrap();
        assert_eq!(
            svc.resolve(Some(&format!("Bearer {ghost}")), &users).unwrap_err(),
            AuthError::UnknownSubject
        );
    }
}
