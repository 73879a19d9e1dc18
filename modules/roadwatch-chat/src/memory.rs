// In-memory stores. Used by tests and by single-process deployments that can
// afford to lose conversation state on restart.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::links::{CaptureLink, CaptureLinkStore};
use crate::session::{SaveOutcome, Session, SessionStore};

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, user_id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.lock().await.get(user_id).cloned())
    }

    async fn save(&self, session: &Session) -> Result<SaveOutcome> {
        let mut sessions = self.sessions.lock().await;
        let stored_version = sessions.get(&session.user_id).map(|s| s.version).unwrap_or(0);
        if stored_version != session.version {
            return Ok(SaveOutcome::Conflict);
        }
        let mut stored = session.clone();
        stored.version = session.version + 1;
        sessions.insert(session.user_id.clone(), stored);
        Ok(SaveOutcome::Saved(session.version + 1))
    }
}

#[derive(Default)]
pub struct InMemoryLinkStore {
    links: Mutex<HashMap<String, CaptureLink>>,
}

impl InMemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CaptureLinkStore for InMemoryLinkStore {
    async fn insert(&self, link: &CaptureLink) -> Result<()> {
        self.links.lock().await.insert(link.link_id.clone(), link.clone());
        Ok(())
    }

    async fn get(&self, link_id: &str) -> Result<Option<CaptureLink>> {
        Ok(self.links.lock().await.get(link_id).cloned())
    }

    async fn mark_used(&self, link_id: &str, at: DateTime<Utc>) -> Result<bool> {
        let mut links = self.links.lock().await;
        match links.get_mut(link_id) {
            Some(link) if !link.used => {
                link.used = true;
                link.used_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn reopen(&self, link_id: &str) -> Result<bool> {
        let mut links = self.links.lock().await;
        match links.get_mut(link_id) {
            Some(link) if link.used => {
                link.used = false;
                link.used_at = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
