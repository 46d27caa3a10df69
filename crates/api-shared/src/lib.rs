//! # API Shared
//!
//! Shared utilities and definitions for the survey report API.
//!
//! Contains:
//! - The success/failure response envelope and public error codes
//! - Mapping from core errors to those codes
//! - JWT issuing and bearer-token identity resolution
//! - Shared services like `HealthService`
//!
//! Kept free of any HTTP framework so the mapping rules are testable on their own.

pub mod auth;
pub mod envelope;
pub mod errors;
pub mod health;

pub use auth::{AuthError, Claims, Identity, JwtService};
pub use envelope::{ApiResponse, ErrorBody, ErrorCode, ErrorResponse};
pub use errors::{auth_error_response, error_response};
pub use health::{HealthRes, HealthService};
