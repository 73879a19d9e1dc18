use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use super::backend::EmailSender;

/// Email relay behind an HTTP webhook. The relay receives
/// `{to, subject, report}` and owns formatting and SMTP.
pub struct EmailWebhook {
    webhook_url: String,
    http: reqwest::Client,
}

impl EmailWebhook {
    pub fn new(webhook_url: String, http: reqwest::Client) -> Self {
        Self { webhook_url, http }
    }
}

#[async_trait]
impl EmailSender for EmailWebhook {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        payload: &serde_json::Value,
    ) -> anyhow::Result<()> {
        let body = json!({
            "to": recipient,
            "subject": subject,
            "report": payload,
        });

        let resp = self.http.post(&self.webhook_url).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %text, "Email webhook returned non-success");
            anyhow::bail!("Email webhook returned {status}");
        }

        Ok(())
    }
}
