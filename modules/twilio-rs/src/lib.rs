use std::collections::HashMap;

pub mod models;
use reqwest::{header, Client};
use thiserror::Error;
use tracing::warn;

use crate::models::{ApiErrorBody, MessageResponse};

const WHATSAPP_SCHEME: &str = "whatsapp:";

#[derive(Error, Debug)]
pub enum TwilioError {
    #[error("Invalid recipient format: {0}")]
    InvalidRecipient(String),

    #[error("Recipient cannot receive messages (code {0})")]
    Undeliverable(i64),

    #[error("Twilio returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request to Twilio failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Check if a string is a valid phone number (E.164 format)
fn is_phone_number(identifier: &str) -> bool {
    identifier.starts_with('+')
        && identifier.len() >= 10
        && identifier[1..].chars().all(|c| c.is_ascii_digit())
}

/// Check if a string is a WhatsApp channel address (`whatsapp:+E164`)
fn is_whatsapp_address(identifier: &str) -> bool {
    identifier
        .strip_prefix(WHATSAPP_SCHEME)
        .map(is_phone_number)
        .unwrap_or(false)
}

#[derive(Debug, Clone)]
pub struct TwilioOptions {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender address, e.g. `whatsapp:+14155238886`.
    pub from_number: String,
}

#[derive(Debug, Clone)]
pub struct TwilioService {
    options: TwilioOptions,
    http: Client,
}

impl TwilioService {
    /// `http` should carry a request timeout; sends sit on the webhook's
    /// response path.
    pub fn new(options: TwilioOptions, http: Client) -> Self {
        Self { options, http }
    }

    /// Send a text message to a WhatsApp or SMS recipient.
    pub async fn send_message(
        &self,
        recipient: &str,
        body: &str,
    ) -> Result<MessageResponse, TwilioError> {
        if !is_whatsapp_address(recipient) && !is_phone_number(recipient) {
            return Err(TwilioError::InvalidRecipient(recipient.to_string()));
        }

        // WhatsApp recipients must be addressed from a WhatsApp sender and vice versa.
        let from = if recipient.starts_with(WHATSAPP_SCHEME)
            && !self.options.from_number.starts_with(WHATSAPP_SCHEME)
        {
            format!("{WHATSAPP_SCHEME}{}", self.options.from_number)
        } else {
            self.options.from_number.clone()
        };

        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{sid}/Messages.json",
            sid = self.options.account_sid
        );

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/x-www-form-urlencoded"),
        );

        let mut form_body: HashMap<&str, &str> = HashMap::new();
        form_body.insert("To", recipient);
        form_body.insert("From", &from);
        form_body.insert("Body", body);

        let response = self
            .http
            .post(url)
            .basic_auth(&self.options.account_sid, Some(&self.options.auth_token))
            .headers(headers)
            .form(&form_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Twilio message send rejected");

            if let Ok(error) = serde_json::from_str::<ApiErrorBody>(&error_body) {
                if let Some(code) = error.code {
                    match code {
                        // 21211 invalid To, 21610 unsubscribed, 63016 outside the WhatsApp session window
                        21211 | 21610 | 63016 => return Err(TwilioError::Undeliverable(code)),
                        _ => {}
                    }
                }
                return Err(TwilioError::Api {
                    status: status.as_u16(),
                    message: error.message.unwrap_or_else(|| "unknown error".to_string()),
                });
            }

            return Err(TwilioError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let message = response.json::<MessageResponse>().await?;
        if let Some(code) = message.error_code {
            return Err(TwilioError::Undeliverable(code));
        }
        Ok(message)
    }
}
