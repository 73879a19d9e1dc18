use async_trait::async_trait;

/// Provider receipt for an accepted outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub message_id: String,
}

/// Outbound chat channel. `recipient` is a full transport address such as
/// `whatsapp:+919876543210`.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, recipient: &str, body: &str) -> anyhow::Result<SentMessage>;
}

/// Outbound email to a division inbox.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        payload: &serde_json::Value,
    ) -> anyhow::Result<()>;
}
