use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Upper bound for any outbound call made while a citizen waits for a reply.
const OUTBOUND_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

use roadwatch_api::db::{self, PgCaptureLinkStore, PgDivisionSource, PgReportStore, PgSessionStore};
use roadwatch_api::notify::{EmailSender, EmailWebhook, NoopEmailSender, TwilioSender};
use roadwatch_api::storage::{DisabledObjectStore, HttpObjectStore, ObjectStore};
use roadwatch_api::{build_router, AppState, ChatService, ReportIngestionPipeline};
use roadwatch_chat::{EngineConfig, LinkTokenGuard};
use roadwatch_common::Config;
use roadwatch_geo::PolygonIndex;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("roadwatch=info".parse()?))
        .init();

    let config = Config::from_env();
    config.log_redacted();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    db::migrate(&pool).await?;
    info!("Database migrations applied");

    let http_client = reqwest::Client::builder()
        .timeout(OUTBOUND_TIMEOUT)
        .build()?;

    let messages = Arc::new(TwilioSender::new(
        config.twilio_account_sid.clone(),
        config.twilio_auth_token.clone(),
        config.twilio_from_number.clone(),
        http_client.clone(),
    ));
    let email: Arc<dyn EmailSender> = match &config.email_webhook_url {
        Some(url) => Arc::new(EmailWebhook::new(url.clone(), http_client.clone())),
        None => Arc::new(NoopEmailSender),
    };
    let objects: Arc<dyn ObjectStore> = match &config.object_store_url {
        Some(url) => Arc::new(HttpObjectStore::new(url.clone(), http_client)),
        None => Arc::new(DisabledObjectStore),
    };

    let divisions = PolygonIndex::new(
        Arc::new(PgDivisionSource::new(pool.clone())),
        Duration::hours(config.polygon_cache_ttl_hours),
    );
    let pipeline = Arc::new(ReportIngestionPipeline::new(
        Arc::new(divisions),
        Arc::new(PgReportStore::new(pool.clone())),
        messages.clone(),
        email,
        objects,
        config.max_officers_notified,
    ));

    let sessions = Arc::new(PgSessionStore::new(pool.clone()));
    let links = Arc::new(LinkTokenGuard::new(
        Arc::new(PgCaptureLinkStore::new(pool)),
        Duration::minutes(config.link_ttl_minutes),
    ));
    let engine = EngineConfig {
        capture_mode: config.capture_mode,
        session_timeout: Duration::minutes(config.session_timeout_minutes),
    };

    let chat = ChatService::new(
        sessions.clone(),
        links.clone(),
        pipeline.clone(),
        messages,
        engine,
        config.public_base_url.clone(),
    );

    let state = Arc::new(AppState {
        chat,
        pipeline,
        links,
        sessions,
    });
    let app = build_router(state, &config.allowed_origins);

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("RoadWatch API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
