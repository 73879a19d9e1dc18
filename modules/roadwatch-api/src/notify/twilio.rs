use async_trait::async_trait;
use tracing::debug;

use twilio::{TwilioOptions, TwilioService};

use super::backend::{MessageSender, SentMessage};

/// WhatsApp delivery through the Twilio Messages API.
pub struct TwilioSender {
    service: TwilioService,
}

impl TwilioSender {
    pub fn new(
        account_sid: String,
        auth_token: String,
        from_number: String,
        http: reqwest::Client,
    ) -> Self {
        Self {
            service: TwilioService::new(
                TwilioOptions {
                    account_sid,
                    auth_token,
                    from_number,
                },
                http,
            ),
        }
    }
}

#[async_trait]
impl MessageSender for TwilioSender {
    async fn send(&self, recipient: &str, body: &str) -> anyhow::Result<SentMessage> {
        let response = self.service.send_message(recipient, body).await?;
        debug!(sid = response.sid.as_str(), status = response.status.as_str(), "Twilio accepted message");
        Ok(SentMessage {
            message_id: response.sid,
        })
    }
}
