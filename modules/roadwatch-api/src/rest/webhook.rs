use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use tracing::warn;

use roadwatch_chat::{InboundMessage, Media};
use roadwatch_common::GeoLocation;
use roadwatch_geo::parse_coordinate;

use crate::AppState;

/// Twilio's inbound message webhook fields. Everything arrives as text.
#[derive(Debug, Default, Deserialize)]
pub struct TwilioInbound {
    #[serde(rename = "From", default)]
    pub from: String,
    #[serde(rename = "Body", default)]
    pub body: String,
    #[serde(rename = "NumMedia")]
    pub num_media: Option<String>,
    #[serde(rename = "MediaUrl0")]
    pub media_url: Option<String>,
    #[serde(rename = "MediaContentType0")]
    pub media_content_type: Option<String>,
    #[serde(rename = "Latitude")]
    pub latitude: Option<String>,
    #[serde(rename = "Longitude")]
    pub longitude: Option<String>,
    #[serde(rename = "Address")]
    pub address: Option<String>,
}

impl TwilioInbound {
    pub fn into_message(self) -> InboundMessage {
        let media_count = self
            .num_media
            .as_deref()
            .and_then(|n| n.trim().parse::<u32>().ok())
            .unwrap_or(0);
        let media = match self.media_url {
            Some(url) if media_count > 0 && !url.trim().is_empty() => Some(Media {
                url,
                content_type: self.media_content_type,
            }),
            _ => None,
        };

        let lat = self.latitude.as_deref().and_then(parse_coordinate);
        let lng = self.longitude.as_deref().and_then(parse_coordinate);
        let location = match (lat, lng) {
            (Some(lat), Some(lng)) => Some(GeoLocation {
                lat,
                lng,
                address: self.address.filter(|a| !a.trim().is_empty()),
            }),
            _ => None,
        };

        InboundMessage {
            text: self.body,
            media,
            location,
        }
    }
}

/// Always acknowledges with an empty TwiML document so the provider does not
/// retry; replies go out through the Messages API instead.
pub async fn whatsapp_webhook(
    State(state): State<Arc<AppState>>,
    form: Result<Form<TwilioInbound>, FormRejection>,
) -> Response {
    match form {
        Ok(Form(inbound)) => {
            let from = inbound.from.clone();
            if let Err(e) = state.chat.handle(&from, inbound.into_message()).await {
                warn!(error = %e, "Failed to handle inbound chat message");
            }
        }
        Err(e) => warn!(error = %e, "Malformed webhook payload"),
    }
    twiml_ack()
}

fn twiml_ack() -> Response {
    (
        [(header::CONTENT_TYPE, "text/xml")],
        "<Response></Response>",
    )
        .into_response()
}
