use api_rest::{router, AppState};
use api_shared::JwtService;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use survey_core::{
    config::parse_env_value,
    constants::{
        DEFAULT_CORRECTIVE_ACTION_DAYS, DEFAULT_NOTIFICATION_DELAY_MS,
        DEFAULT_NOTIFICATION_FAILURE_RATE, DEFAULT_UPLOAD_MAX_BYTES,
    },
    seed::seed_demo_data,
    CoreConfig, InMemoryReportStore, ReportStore, UserStore,
};
use survey_files::{AttachmentStore, UploadValidator};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_TOKEN_TTL_HOURS: u64 = 24;
const DEFAULT_DEMO_PASSWORD: &str = "password123";

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Main entry point for the survey report service
///
/// Resolves configuration from the environment (after loading `.env`), optionally seeds demo
/// data, and serves the REST API until Ctrl-C.
///
/// # Environment Variables
/// - `SURVEY_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `SURVEY_JWT_SECRET`: HS256 signing secret, at least 32 characters (required)
/// - `SURVEY_TOKEN_TTL_HOURS`: Access token lifetime (default: 24)
/// - `SURVEY_NOTIFY_FAILURE_RATE`: Simulated notification failure fraction (default: 0.1)
/// - `SURVEY_NOTIFY_DELAY_MS`: Simulated notification latency (default: 100)
/// - `SURVEY_CORRECTIVE_ACTION_DAYS`: Default corrective-action horizon (default: 30)
/// - `SURVEY_UPLOAD_MAX_BYTES`: Upload size limit (default: 10 MiB)
/// - `SURVEY_UPLOAD_DIR`: Attachment root directory (default: "uploads")
/// - `SURVEY_SEED_DEMO_DATA`: Seed demo users and a sample report (default: true)
/// - `SURVEY_DEMO_PASSWORD`: Password for seeded users (default: "password123")
///
/// # Errors
/// Returns an error if:
/// - a configuration value is missing or malformed,
/// - the upload directory cannot be created,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("survey=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("api_shared=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = env("SURVEY_REST_ADDR").unwrap_or_else(|| DEFAULT_REST_ADDR.into());

    let cfg = Arc::new(CoreConfig::new(
        parse_env_value(
            "SURVEY_NOTIFY_FAILURE_RATE",
            env("SURVEY_NOTIFY_FAILURE_RATE"),
            DEFAULT_NOTIFICATION_FAILURE_RATE,
        )?,
        Duration::from_millis(parse_env_value(
            "SURVEY_NOTIFY_DELAY_MS",
            env("SURVEY_NOTIFY_DELAY_MS"),
            DEFAULT_NOTIFICATION_DELAY_MS,
        )?),
        parse_env_value(
            "SURVEY_CORRECTIVE_ACTION_DAYS",
            env("SURVEY_CORRECTIVE_ACTION_DAYS"),
            DEFAULT_CORRECTIVE_ACTION_DAYS,
        )?,
        parse_env_value(
            "SURVEY_UPLOAD_MAX_BYTES",
            env("SURVEY_UPLOAD_MAX_BYTES"),
            DEFAULT_UPLOAD_MAX_BYTES,
        )?,
    )?);

    let secret = env("SURVEY_JWT_SECRET")
        .ok_or_else(|| anyhow::anyhow!("SURVEY_JWT_SECRET must be set"))?;
    let ttl_hours = parse_env_value(
        "SURVEY_TOKEN_TTL_HOURS",
        env("SURVEY_TOKEN_TTL_HOURS"),
        DEFAULT_TOKEN_TTL_HOURS,
    )?;
    let jwt = JwtService::new(secret, ttl_hours)?;

    let upload_dir =
        PathBuf::from(env("SURVEY_UPLOAD_DIR").unwrap_or_else(|| DEFAULT_UPLOAD_DIR.into()));
    let files = Arc::new(AttachmentStore::new(
        &upload_dir,
        UploadValidator::new(cfg.upload_max_bytes()),
    )?);

    let store = Arc::new(InMemoryReportStore::new());
    let users = Arc::new(UserStore::new());

    if parse_env_value("SURVEY_SEED_DEMO_DATA", env("SURVEY_SEED_DEMO_DATA"), true)? {
        let password =
            env("SURVEY_DEMO_PASSWORD").unwrap_or_else(|| DEFAULT_DEMO_PASSWORD.into());
        seed_demo_data(&users, store.as_ref(), &password)?;
    }

    let store: Arc<dyn ReportStore> = store;
    let app = router(AppState::new(cfg, store, files, users, jwt));

    tracing::info!("++ Starting survey REST API on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- Survey REST API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
}
