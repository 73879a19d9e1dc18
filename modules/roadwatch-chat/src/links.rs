//! Single-use, time-boxed capture links for the chat → web form hand-off.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use roadwatch_common::{normalize_user_id, ReportType};

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureLink {
    pub link_id: String,
    /// Digits only, no scheme or `+`.
    pub user_id: String,
    pub report_type: ReportType,
    pub created_at: DateTime<Utc>,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkStatus {
    Valid,
    NotFound,
    Expired,
    AlreadyUsed,
}

impl LinkStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, LinkStatus::Valid)
    }

    pub fn reason_code(&self) -> &'static str {
        match self {
            LinkStatus::Valid => "LINK_VALID",
            LinkStatus::NotFound => "LINK_NOT_FOUND",
            LinkStatus::Expired => "LINK_EXPIRED",
            LinkStatus::AlreadyUsed => "LINK_ALREADY_USED",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            LinkStatus::Valid => "Link is valid",
            LinkStatus::NotFound => "This link is invalid. Please request a new one from WhatsApp.",
            LinkStatus::Expired => "This link has expired. Please request a new one from WhatsApp.",
            LinkStatus::AlreadyUsed => "This link has already been used.",
        }
    }
}

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("capture link rejected: {}", .0.reason_code())]
    Rejected(LinkStatus),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[async_trait]
pub trait CaptureLinkStore: Send + Sync {
    async fn insert(&self, link: &CaptureLink) -> Result<()>;

    async fn get(&self, link_id: &str) -> Result<Option<CaptureLink>>;

    /// Atomically flip `used` from false to true. Returns false if the link is
    /// missing or was already used.
    async fn mark_used(&self, link_id: &str, at: DateTime<Utc>) -> Result<bool>;

    /// Flip `used` back to false. Returns false if the link is missing or was
    /// not marked used.
    async fn reopen(&self, link_id: &str) -> Result<bool>;
}

/// Status of `link` for `user_id` at `now`. Checks run in order:
/// existence (including owner), used flag, age.
pub fn link_status(
    link: Option<&CaptureLink>,
    user_id: &str,
    now: DateTime<Utc>,
    ttl: Duration,
) -> LinkStatus {
    let Some(link) = link else {
        return LinkStatus::NotFound;
    };
    if normalize_user_id(&link.user_id) != normalize_user_id(user_id) {
        return LinkStatus::NotFound;
    }
    if link.used {
        return LinkStatus::AlreadyUsed;
    }
    if now - link.created_at > ttl {
        return LinkStatus::Expired;
    }
    LinkStatus::Valid
}

pub struct LinkTokenGuard {
    store: Arc<dyn CaptureLinkStore>,
    ttl: Duration,
}

impl LinkTokenGuard {
    pub fn new(store: Arc<dyn CaptureLinkStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl_minutes(&self) -> i64 {
        self.ttl.num_minutes()
    }

    pub async fn issue(&self, user_id: &str, report_type: ReportType) -> Result<CaptureLink> {
        self.issue_at(user_id, report_type, Utc::now()).await
    }

    pub async fn issue_at(
        &self,
        user_id: &str,
        report_type: ReportType,
        now: DateTime<Utc>,
    ) -> Result<CaptureLink> {
        let link = CaptureLink {
            link_id: Uuid::new_v4().simple().to_string(),
            user_id: normalize_user_id(user_id),
            report_type,
            created_at: now,
            used: false,
            used_at: None,
        };
        self.store.insert(&link).await?;
        info!(report_type = %report_type, "Capture link issued");
        Ok(link)
    }

    /// Look up a link and report its status without changing it.
    pub async fn validate(&self, link_id: &str, user_id: &str) -> Result<LinkStatus> {
        self.validate_at(link_id, user_id, Utc::now()).await
    }

    pub async fn validate_at(
        &self,
        link_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<LinkStatus> {
        let link = self.store.get(link_id).await?;
        Ok(link_status(link.as_ref(), user_id, now, self.ttl))
    }

    /// Take a link for a submission. The link is marked used before the caller
    /// acts on it, so concurrent submissions of one link have a single winner.
    /// Hand it back with `release` if the submission is rejected.
    pub async fn claim(&self, link_id: &str, user_id: &str) -> Result<CaptureLink, LinkError> {
        self.claim_at(link_id, user_id, Utc::now()).await
    }

    pub async fn claim_at(
        &self,
        link_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<CaptureLink, LinkError> {
        let link = self.store.get(link_id).await?;
        let status = link_status(link.as_ref(), user_id, now, self.ttl);
        let Some(mut link) = link.filter(|_| status.is_valid()) else {
            return Err(LinkError::Rejected(status));
        };
        if !self.store.mark_used(link_id, now).await? {
            warn!("Capture link claimed concurrently");
            return Err(LinkError::Rejected(LinkStatus::AlreadyUsed));
        }
        link.used = true;
        link.used_at = Some(now);
        Ok(link)
    }

    /// Reopen a claimed link whose submission did not go through. It stays
    /// subject to its original expiry.
    pub async fn release(&self, link_id: &str) -> Result<()> {
        if !self.store.reopen(link_id).await? {
            warn!("Released a capture link that was not claimed");
        }
        Ok(())
    }

    pub async fn consume(&self, link_id: &str, user_id: &str) -> Result<(), LinkError> {
        self.consume_at(link_id, user_id, Utc::now()).await
    }

    /// Validate then mark used. Exactly one caller wins a race on the same
    /// link; the others see `AlreadyUsed`.
    pub async fn consume_at(
        &self,
        link_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), LinkError> {
        let status = self.validate_at(link_id, user_id, now).await?;
        if !status.is_valid() {
            return Err(LinkError::Rejected(status));
        }
        if !self.store.mark_used(link_id, now).await? {
            warn!("Capture link consumed concurrently");
            return Err(LinkError::Rejected(LinkStatus::AlreadyUsed));
        }
        Ok(())
    }
}
