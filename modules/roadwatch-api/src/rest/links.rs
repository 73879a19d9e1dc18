use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkQuery {
    #[serde(default)]
    pub user_id: String,
}

/// `GET /api/links/{link_id}?userId=`: lets the form check a link before the
/// user fills it in. Never marks the link used.
pub async fn api_check_link(
    State(state): State<Arc<AppState>>,
    Path(link_id): Path<String>,
    Query(query): Query<LinkQuery>,
) -> Response {
    match state.links.validate(&link_id, &query.user_id).await {
        Ok(status) if status.is_valid() => Json(json!({"valid": true})).into_response(),
        Ok(status) => Json(json!({
            "valid": false,
            "reason": status.reason_code(),
            "message": status.message(),
        }))
        .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to check capture link");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"valid": false, "message": "Could not verify the link"})),
            )
                .into_response()
        }
    }
}
