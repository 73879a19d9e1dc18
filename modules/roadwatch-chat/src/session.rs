use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use roadwatch_common::{Language, ReportType};

use crate::state::ConversationState;

/// Per-user conversation record, keyed on the digits-only user id.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: String,
    pub state: ConversationState,
    /// Category picked from the menu, pending until the flow completes.
    pub last_option: Option<ReportType>,
    pub language: Language,
    pub user_name: Option<String>,
    pub last_interaction: DateTime<Utc>,
    pub last_description: Option<String>,
    pub last_photo_url: Option<String>,
    /// Optimistic-concurrency token. 0 means "never stored".
    pub version: i64,
}

impl Session {
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            state: ConversationState::LanguageSelect,
            last_option: None,
            language: Language::default(),
            user_name: None,
            last_interaction: now,
            last_description: None,
            last_photo_url: None,
            version: 0,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now - self.last_interaction > timeout
    }

    /// Return to the entry point after inactivity. Users we already know skip
    /// straight to the menu.
    pub fn reset_after_timeout(&mut self) {
        self.state = if self.user_name.is_some() {
            ConversationState::Menu
        } else {
            ConversationState::LanguageSelect
        };
        self.clear_pending();
    }

    pub fn clear_pending(&mut self) {
        self.last_option = None;
        self.last_description = None;
        self.last_photo_url = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Written; carries the new stored version.
    Saved(i64),
    /// Someone else wrote the session since it was loaded.
    Conflict,
}

/// Keyed session repository with compare-and-swap writes.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, user_id: &str) -> Result<Option<Session>>;

    /// Persist `session` if the stored version still equals `session.version`
    /// (for version 0: if no row exists yet). The stored version becomes
    /// `session.version + 1`.
    async fn save(&self, session: &Session) -> Result<SaveOutcome>;
}
