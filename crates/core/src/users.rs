//! User directory.
//!
//! The report pipeline only ever consumes an `(actor id, role)` pair. This module is the
//! collaborator that backs it: user records, password verification for login, and the existence
//! check the identity resolver performs on every bearer token.

use crate::error::{ConflictKind, SurveyError, SurveyResult};
use crate::model::Role;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};
use survey_types::NonEmptyText;
use survey_uuid::RecordId;
use utoipa::ToSchema;

/// A stored user. The password hash is never serialised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRecord {
    pub id: RecordId,
    pub username: NonEmptyText,
    pub role: Role,
    pub password_hash: String,
}

/// Public projection of a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct UserProfile {
    #[schema(value_type = String)]
    pub id: RecordId,
    #[schema(value_type = String)]
    pub username: NonEmptyText,
    pub role: Role,
}

impl From<&UserRecord> for UserProfile {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

/// Hash a password using Argon2id, returning the PHC string.
pub fn hash_password(password: &str) -> SurveyResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| SurveyError::Internal(format!("failed to hash password: {e}")))
}

/// Verify a password against a stored PHC hash.
pub fn verify_password(password: &str, hash: &str) -> SurveyResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| SurveyError::Internal(format!("invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Hash verified on the unknown-username path so a miss costs the same Argon2 work as a hit.
fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("survey-login-placeholder").ok())
        .as_deref()
}

#[derive(Default)]
pub struct UserStore {
    users: RwLock<HashMap<RecordId, UserRecord>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, id: &RecordId) -> Option<UserRecord> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Case-insensitive username lookup.
    pub fn find_by_username(&self, username: &str) -> Option<UserRecord> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .find(|u| u.username.as_str().eq_ignore_ascii_case(username.trim()))
            .cloned()
    }

    /// Inserts a user, rejecting duplicate usernames.
    pub fn insert(&self, user: UserRecord) -> SurveyResult<UserRecord> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);

        let taken = users.values().any(|u| {
            u.username
                .as_str()
                .eq_ignore_ascii_case(user.username.as_str())
        });
        if taken {
            return Err(SurveyError::Conflict(ConflictKind::DuplicateUsername(
                user.username.to_string(),
            )));
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    /// Creates and stores a user with a freshly hashed password.
    pub fn register(&self, username: &str, password: &str, role: Role) -> SurveyResult<UserRecord> {
        let username = NonEmptyText::new(username)
            .map_err(|e| SurveyError::invalid_field("username", e.to_string()))?;
        if password.is_empty() {
            return Err(SurveyError::invalid_field("password", "cannot be empty"));
        }

        self.insert(UserRecord {
            id: RecordId::new(),
            username,
            role,
            password_hash: hash_password(password)?,
        })
    }

    /// Verifies credentials for login.
    ///
    /// Unknown usernames and wrong passwords produce the same error.
    pub fn authenticate(&self, username: &str, password: &str) -> SurveyResult<UserRecord> {
        let invalid = || SurveyError::Unauthenticated("invalid username or password".into());

        let Some(user) = self.find_by_username(username) else {
            if let Some(hash) = dummy_hash() {
                verify_password(password, hash)?;
            }
            return Err(invalid());
        };
        if verify_password(password, &user.password_hash)? {
            Ok(user)
        } else {
            Err(invalid())
        }
    }
}
