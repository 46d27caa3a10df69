//! # Survey Core
//!
//! Core business logic for accreditation survey reports.
//!
//! This crate contains the pure report operations:
//! - the authorization policy (role × operation, role × report status)
//! - the report query/formatting engine (full, summary and field-selected shapes)
//! - the mutation pipeline with optimistic concurrency on `version`
//! - the fire-and-forget creation notification
//!
//! **No API concerns**: JWT handling, HTTP routing and response envelopes belong in `api-shared`
//! and `api-rest`. Callers hand the core an already-resolved [`Actor`].

pub mod config;
pub mod constants;
pub mod error;
pub mod model;
pub mod notification;
pub mod policy;
pub mod query;
pub mod repositories;
pub mod seed;
pub mod store;
pub mod summary;
pub mod users;
pub mod validation;

pub use config::CoreConfig;
pub use error::{
    ConflictKind, FieldIssue, ForbiddenDetails, Operation, SurveyError, SurveyResult,
    VersionMismatch,
};
pub use model::{
    AccreditationBody, Actor, Deficiency, NewDeficiency, NewReport, Report, ReportPatch,
    ReportStatus, Role, Severity, SurveyType, UnknownVariant,
};
pub use notification::{NotificationError, NotificationService};
pub use query::{ReportQuery, ReportQueryParams, ReportRepresentation};
pub use repositories::attachments::{AttachmentService, Upload};
pub use repositories::reports::ReportService;
pub use store::{InMemoryReportStore, ReportStore};
pub use summary::ReportSummary;
pub use users::{UserProfile, UserRecord, UserStore};
