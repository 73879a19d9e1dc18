pub mod links;
pub mod reports;
pub mod suggestions;
pub mod webhook;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::warn;

use roadwatch_chat::LinkStatus;
use roadwatch_common::Language;

use crate::pipeline::{Rejection, RejectionReason};
use crate::AppState;

pub(crate) fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({"success": false, "reason": code, "message": message})),
    )
        .into_response()
}

pub(crate) fn link_rejected(status: LinkStatus) -> Response {
    let http_status = match status {
        LinkStatus::NotFound | LinkStatus::Valid => StatusCode::NOT_FOUND,
        LinkStatus::Expired => StatusCode::GONE,
        LinkStatus::AlreadyUsed => StatusCode::CONFLICT,
    };
    error_response(http_status, status.reason_code(), status.message())
}

pub(crate) fn rejection_response(rejection: &Rejection) -> Response {
    let (status, message) = match rejection.reason {
        RejectionReason::MissingFields => {
            (StatusCode::BAD_REQUEST, "Required fields are missing")
        }
        RejectionReason::OutsideJurisdiction => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "This location is outside our jurisdiction",
        ),
        RejectionReason::NotificationFailed => (
            StatusCode::FAILED_DEPENDENCY,
            "No officer could be notified; the report was not registered",
        ),
        RejectionReason::StorageFailed => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "The report could not be saved",
        ),
    };
    error_response(status, rejection.reason.code(), message)
}

/// Display name and language from the user's chat session, if any.
pub(crate) async fn session_profile(state: &AppState, user_id: &str) -> (Option<String>, Language) {
    match state.sessions.load(user_id).await {
        Ok(Some(session)) => (session.user_name, session.language),
        Ok(None) => (None, Language::default()),
        Err(e) => {
            warn!(error = %e, "Failed to load session for submission");
            (None, Language::default())
        }
    }
}

/// Hand a claimed link back after its submission was turned down, so the
/// citizen can correct the form and retry before the link expires.
pub(crate) async fn release_link(state: &AppState, link_id: &str) {
    if let Err(e) = state.links.release(link_id).await {
        warn!(error = %e, "Failed to reopen capture link");
    }
}
