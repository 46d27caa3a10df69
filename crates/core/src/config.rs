//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into services as
//! `Arc<CoreConfig>`. Services never read environment variables while handling a request.

use crate::constants::{
    DEFAULT_CORRECTIVE_ACTION_DAYS, DEFAULT_NOTIFICATION_DELAY_MS,
    DEFAULT_NOTIFICATION_FAILURE_RATE, DEFAULT_UPLOAD_MAX_BYTES, MAX_CORRECTIVE_ACTION_DAYS,
};
use crate::{SurveyError, SurveyResult};
use std::str::FromStr;
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    notification_failure_rate: f64,
    notification_delay: Duration,
    corrective_action_days: i64,
    upload_max_bytes: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            notification_failure_rate: DEFAULT_NOTIFICATION_FAILURE_RATE,
            notification_delay: Duration::from_millis(DEFAULT_NOTIFICATION_DELAY_MS),
            corrective_action_days: DEFAULT_CORRECTIVE_ACTION_DAYS,
            upload_max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
        }
    }
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::Validation` if:
    /// - `notification_failure_rate` is not within `0.0..=1.0`,
    /// - `corrective_action_days` is not within `0..=MAX_CORRECTIVE_ACTION_DAYS`,
    /// - `upload_max_bytes` is zero.
    pub fn new(
        notification_failure_rate: f64,
        notification_delay: Duration,
        corrective_action_days: i64,
        upload_max_bytes: u64,
    ) -> SurveyResult<Self> {
        if !(0.0..=1.0).contains(&notification_failure_rate) {
            return Err(SurveyError::invalid_field(
                "notification_failure_rate",
                "must be between 0 and 1",
            ));
        }
        if !(0..=MAX_CORRECTIVE_ACTION_DAYS).contains(&corrective_action_days) {
            return Err(SurveyError::invalid_field(
                "corrective_action_days",
                format!("must be between 0 and {MAX_CORRECTIVE_ACTION_DAYS}"),
            ));
        }
        if upload_max_bytes == 0 {
            return Err(SurveyError::invalid_field(
                "upload_max_bytes",
                "must be greater than zero",
            ));
        }

        Ok(Self {
            notification_failure_rate,
            notification_delay,
            corrective_action_days,
            upload_max_bytes,
        })
    }

    pub fn notification_failure_rate(&self) -> f64 {
        self.notification_failure_rate
    }

    pub fn notification_delay(&self) -> Duration {
        self.notification_delay
    }

    pub fn corrective_action_days(&self) -> i64 {
        self.corrective_action_days
    }

    pub fn upload_max_bytes(&self) -> u64 {
        self.upload_max_bytes
    }
}

/// Parse an optional environment value, falling back to `default` when unset or blank.
///
/// # Errors
///
/// Returns `SurveyError::Validation` naming `name` if the value does not parse.
pub fn parse_env_value<T: FromStr>(name: &str, value: Option<String>, default: T) -> SurveyResult<T> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| SurveyError::invalid_field(name, format!("cannot parse '{raw}'"))),
    }
}
