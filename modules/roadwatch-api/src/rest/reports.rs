use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use roadwatch_chat::{CaptureLink, LinkError};
use roadwatch_common::{GeoLocation, JoinDetails, ReportDraft, ReportType};
use roadwatch_geo::parse_coordinate;

use super::{error_response, link_rejected, rejection_response, release_link, session_profile};
use crate::pipeline::validate;
use crate::AppState;

/// Multipart fields posted by the capture form.
#[derive(Debug, Default)]
struct ReportForm {
    link_id: String,
    user_id: String,
    description: String,
    latitude: String,
    longitude: String,
    address: String,
    image: Option<(Vec<u8>, String)>,
}

impl ReportForm {
    async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" | "photo" => {
                    let mime = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await?;
                    if !bytes.is_empty() {
                        form.image = Some((bytes.to_vec(), mime));
                    }
                }
                "linkId" => form.link_id = field.text().await?,
                "userId" => form.user_id = field.text().await?,
                "description" => form.description = field.text().await?,
                "latitude" => form.latitude = field.text().await?,
                "longitude" => form.longitude = field.text().await?,
                "address" => form.address = field.text().await?,
                _ => {}
            }
        }
        Ok(form)
    }
}

/// Claim a link for a submission or produce the error response.
async fn claim_link(state: &AppState, link_id: &str, user_id: &str) -> Result<CaptureLink, Response> {
    if link_id.trim().is_empty() || user_id.trim().is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "MISSING_FIELDS",
            "linkId and userId are required",
        ));
    }
    match state.links.claim(link_id.trim(), user_id).await {
        Ok(link) => Ok(link),
        Err(LinkError::Rejected(status)) => {
            info!(reason = status.reason_code(), "Submission with unusable link");
            Err(link_rejected(status))
        }
        Err(LinkError::Store(e)) => {
            warn!(error = %e, "Failed to look up capture link");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "LINK_LOOKUP_FAILED",
                "Could not verify the link, please try again",
            ))
        }
    }
}

fn wrong_link_type() -> Response {
    error_response(
        StatusCode::BAD_REQUEST,
        "WRONG_LINK_TYPE",
        "This link cannot be used for this form",
    )
}

/// `POST /api/reports`: incident report from the capture form.
pub async fn api_submit_report(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Response {
    let form = match ReportForm::read(multipart).await {
        Ok(form) => form,
        Err(e) => {
            warn!(error = %e, "Unreadable report form");
            return error_response(StatusCode::BAD_REQUEST, "INVALID_FORM", &e.body_text());
        }
    };

    let link = match claim_link(&state, &form.link_id, &form.user_id).await {
        Ok(link) => link,
        Err(response) => return response,
    };
    if !link.report_type.requires_location() {
        release_link(&state, &link.link_id).await;
        return wrong_link_type();
    }

    let (Some(lat), Some(lng)) = (
        parse_coordinate(&form.latitude),
        parse_coordinate(&form.longitude),
    ) else {
        release_link(&state, &link.link_id).await;
        return error_response(
            StatusCode::BAD_REQUEST,
            "INVALID_LOCATION",
            "A valid latitude and longitude are required",
        );
    };

    let photo_url = match form.image {
        Some((bytes, mime)) => state.pipeline.upload_photo(bytes, &mime).await,
        None => None,
    };

    let (user_name, language) = session_profile(&state, &link.user_id).await;
    let address = form.address.trim();
    let draft = ReportDraft {
        user_id: link.user_id.clone(),
        user_name,
        language,
        report_type: link.report_type,
        description: form.description.trim().to_string(),
        photo_url,
        location: Some(GeoLocation {
            lat,
            lng,
            address: (!address.is_empty()).then(|| address.to_string()),
        }),
        join_details: None,
    };

    match state.pipeline.submit(draft).await {
        Ok(accepted) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "reportId": accepted.report_id,
                "divisionName": accepted.division_name,
            })),
        )
            .into_response(),
        Err(rejection) => {
            release_link(&state, &link.link_id).await;
            rejection_response(&rejection)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequestBody {
    #[serde(default)]
    pub link_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
}

/// `POST /api/join`: volunteer application from the join form.
pub async fn api_submit_join(
    State(state): State<Arc<AppState>>,
    Json(body): Json<JoinRequestBody>,
) -> Response {
    let link = match claim_link(&state, &body.link_id, &body.user_id).await {
        Ok(link) => link,
        Err(response) => return response,
    };
    if link.report_type != ReportType::JoinRequest {
        release_link(&state, &link.link_id).await;
        return wrong_link_type();
    }

    let (_, language) = session_profile(&state, &link.user_id).await;
    let details = JoinDetails {
        name: body.name.trim().to_string(),
        email: body.email.trim().to_string(),
        phone: body.phone.trim().to_string(),
        location: body.location.trim().to_string(),
    };
    let draft = ReportDraft {
        user_id: link.user_id.clone(),
        user_name: Some(details.name.clone()).filter(|n| !n.is_empty()),
        language,
        report_type: ReportType::JoinRequest,
        description: String::new(),
        photo_url: None,
        location: None,
        join_details: Some(details),
    };

    // Form-side validation errors are answered here, without a chat message.
    if let Err(rejection) = validate(&draft) {
        release_link(&state, &link.link_id).await;
        return rejection_response(&rejection);
    }

    match state.pipeline.submit(draft).await {
        Ok(accepted) => (
            StatusCode::OK,
            Json(json!({"success": true, "reportId": accepted.report_id})),
        )
            .into_response(),
        Err(rejection) => {
            release_link(&state, &link.link_id).await;
            rejection_response(&rejection)
        }
    }
}
