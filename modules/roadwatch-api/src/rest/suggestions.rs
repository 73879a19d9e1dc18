use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use roadwatch_common::{normalize_user_id, ReportDraft, ReportType};

use super::{error_response, session_profile};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionBody {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub text: String,
    pub link_id: Option<String>,
    pub user_name: Option<String>,
}

/// `POST /api/suggestions`: accepted immediately, processed in the background.
/// A link that is already used or expired does not block the suggestion.
pub async fn api_submit_suggestion(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SuggestionBody>,
) -> Response {
    let user_id = normalize_user_id(&body.user_id);
    let text = body.text.trim().to_string();
    if user_id.is_empty() || text.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "MISSING_FIELDS",
            "userId and text are required",
        );
    }

    let link_id = body.link_id.filter(|l| !l.trim().is_empty());
    let explicit_name = body.user_name.filter(|n| !n.trim().is_empty());

    tokio::spawn(async move {
        let (session_name, language) = session_profile(&state, &user_id).await;
        let draft = ReportDraft {
            user_id: user_id.clone(),
            user_name: explicit_name.or(session_name),
            language,
            report_type: ReportType::Suggestion,
            description: text,
            photo_url: None,
            location: None,
            join_details: None,
        };

        if let Err(rejection) = state.pipeline.submit(draft).await {
            warn!(reason = rejection.reason.code(), "Background suggestion failed");
        }

        if let Some(link_id) = link_id {
            if let Err(e) = state.links.consume(link_id.trim(), &user_id).await {
                debug!(error = %e, "Suggestion link left unchanged");
            }
        }
    });

    (StatusCode::ACCEPTED, Json(json!({"success": true}))).into_response()
}
