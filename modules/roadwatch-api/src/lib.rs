pub mod chat;
pub mod db;
pub mod notify;
pub mod pipeline;
pub mod rest;
pub mod storage;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use roadwatch_chat::{LinkTokenGuard, SessionStore};

pub use chat::ChatService;
pub use pipeline::{Accepted, Rejection, RejectionReason, ReportIngestionPipeline, ReportStore};

/// Upper bound on capture-form bodies (photo included).
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub struct AppState {
    pub chat: ChatService,
    pub pipeline: Arc<ReportIngestionPipeline>,
    pub links: Arc<LinkTokenGuard>,
    pub sessions: Arc<dyn SessionStore>,
}

pub fn build_router(state: Arc<AppState>, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    let cors = if origins.is_empty() {
        CorsLayer::new().allow_origin(Any)
    } else {
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    }
    .allow_methods(Any)
    .allow_headers(Any);

    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Chat transport
        .route("/webhook/whatsapp", post(rest::webhook::whatsapp_webhook))
        // Capture form
        .route("/api/reports", post(rest::reports::api_submit_report))
        .route("/api/join", post(rest::reports::api_submit_join))
        .route("/api/suggestions", post(rest::suggestions::api_submit_suggestion))
        .route("/api/links/{link_id}", get(rest::links::api_check_link))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Method + path only; query strings carry user identifiers.
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}
