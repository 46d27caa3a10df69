use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Health check shared by every API surface
#[derive(Clone, Copy, Debug, Default)]
pub struct HealthService;

impl HealthService {
    /// Static method to check health without creating an instance
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Survey report service is alive".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_healthy() {
        let res = HealthService::check_health();
        assert!(res.ok);
        assert!(!res.message.is_empty());
    }
}
