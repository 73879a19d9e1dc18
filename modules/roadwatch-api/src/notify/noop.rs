use async_trait::async_trait;
use tracing::debug;

use super::backend::EmailSender;

/// Email sender used when no relay is configured.
pub struct NoopEmailSender;

#[async_trait]
impl EmailSender for NoopEmailSender {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        _payload: &serde_json::Value,
    ) -> anyhow::Result<()> {
        debug!(recipient, subject, "Email disabled, dropping division email");
        Ok(())
    }
}
