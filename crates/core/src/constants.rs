//! Constants used throughout the survey core crate.

/// Days added to "now" when a report is created without a corrective-action due date.
pub const DEFAULT_CORRECTIVE_ACTION_DAYS: i64 = 30;

/// Largest accepted corrective-action horizon (about a century).
pub const MAX_CORRECTIVE_ACTION_DAYS: i64 = 36_500;

/// Fraction of notification attempts that fail when no override is configured.
pub const DEFAULT_NOTIFICATION_FAILURE_RATE: f64 = 0.1;

/// Simulated latency of the external notification call, in milliseconds.
pub const DEFAULT_NOTIFICATION_DELAY_MS: u64 = 100;

/// Upload size limit when no override is configured (10 MiB).
pub const DEFAULT_UPLOAD_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Default and maximum page sizes for deficiency pagination.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Number of critical-issue descriptions included in a summary.
pub const MAX_CRITICAL_ISSUES: usize = 3;

/// More than this many major deficiencies raises the summary risk level to "medium".
pub const MEDIUM_RISK_MAJOR_THRESHOLD: usize = 2;

/// Reserved `include` token selecting the fixed basic field set.
pub const INCLUDE_BASIC: &str = "basic";
