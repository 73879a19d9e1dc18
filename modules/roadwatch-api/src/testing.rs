// Test doubles for the API crate's collaborators.
//
// MockMessageSender   records every send; recipients can be marked failing
//                     and sends can be slowed down.
// MockEmailSender     records division emails; can be switched to fail.
// MockObjectStore     hands back deterministic URLs or fails on demand.
// MockReportStore     keeps inserted reports in memory.
// TestDeps            wires the above with in-memory chat stores.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Duration;

use roadwatch_chat::{EngineConfig, InMemoryLinkStore, InMemorySessionStore, LinkTokenGuard};
use roadwatch_common::{CaptureMode, Division, Report};
use roadwatch_geo::testing::CountingDivisionSource;
use roadwatch_geo::PolygonIndex;

use crate::chat::ChatService;
use crate::notify::{EmailSender, MessageSender, SentMessage};
use crate::pipeline::{ReportIngestionPipeline, ReportStore};
use crate::storage::ObjectStore;
use crate::AppState;

pub const TEST_BASE_URL: &str = "https://report.example.test/";

#[derive(Default)]
pub struct MockMessageSender {
    sent: Mutex<Vec<(String, String)>>,
    failing: Mutex<HashSet<String>>,
    delay: Mutex<Option<std::time::Duration>>,
    counter: AtomicUsize,
}

impl MockMessageSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send to `recipient` (full address, e.g. `whatsapp:+91...`) fails.
    pub fn fail_for(&self, recipient: &str) {
        self.failing.lock().unwrap().insert(recipient.to_string());
    }

    /// Hold every send for `delay` before it completes.
    pub fn set_delay(&self, delay: std::time::Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, recipient: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(to, _)| to == recipient)
            .map(|(_, body)| body)
            .collect()
    }
}

#[async_trait]
impl MessageSender for MockMessageSender {
    async fn send(&self, recipient: &str, body: &str) -> Result<SentMessage> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(recipient) {
            bail!("undeliverable: {recipient}");
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), body.to_string()));
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(SentMessage {
            message_id: format!("SM{n:032}"),
        })
    }
}

#[derive(Default)]
pub struct MockEmailSender {
    sent: Mutex<Vec<(String, String, serde_json::Value)>>,
    failing: AtomicBool,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(String, String, serde_json::Value)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for MockEmailSender {
    async fn send(&self, recipient: &str, subject: &str, payload: &serde_json::Value) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("email relay down");
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), subject.to_string(), payload.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct MockObjectStore {
    uploads: AtomicUsize,
    failing: AtomicBool,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn upload(&self, _bytes: Vec<u8>, _mime: &str, folder: &str) -> Result<String> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("bucket unavailable");
        }
        let n = self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://cdn.example.test/{folder}/{n}.jpg"))
    }
}

#[derive(Default)]
pub struct MockReportStore {
    reports: Mutex<Vec<Report>>,
    failing: AtomicBool,
}

impl MockReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportStore for MockReportStore {
    async fn insert(&self, report: &Report) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("database unavailable");
        }
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }
}

/// Every collaborator, in memory, with handles kept for assertions.
pub struct TestDeps {
    pub divisions: Arc<CountingDivisionSource>,
    pub messages: Arc<MockMessageSender>,
    pub email: Arc<MockEmailSender>,
    pub objects: Arc<MockObjectStore>,
    pub reports: Arc<MockReportStore>,
    pub sessions: Arc<InMemorySessionStore>,
    pub links: Arc<LinkTokenGuard>,
    pub max_officers: usize,
}

impl TestDeps {
    pub fn new(divisions: Vec<Division>) -> Self {
        Self {
            divisions: Arc::new(CountingDivisionSource::new(divisions)),
            messages: Arc::new(MockMessageSender::new()),
            email: Arc::new(MockEmailSender::new()),
            objects: Arc::new(MockObjectStore::new()),
            reports: Arc::new(MockReportStore::new()),
            sessions: Arc::new(InMemorySessionStore::new()),
            links: Arc::new(LinkTokenGuard::new(
                Arc::new(InMemoryLinkStore::new()),
                Duration::minutes(5),
            )),
            max_officers: 2,
        }
    }

    pub fn pipeline(&self) -> Arc<ReportIngestionPipeline> {
        let index = PolygonIndex::new(self.divisions.clone(), Duration::hours(24));
        Arc::new(ReportIngestionPipeline::new(
            Arc::new(index),
            self.reports.clone(),
            self.messages.clone(),
            self.email.clone(),
            self.objects.clone(),
            self.max_officers,
        ))
    }

    pub fn app_state(&self, capture_mode: CaptureMode) -> Arc<AppState> {
        let pipeline = self.pipeline();
        let engine = EngineConfig {
            capture_mode,
            ..EngineConfig::default()
        };
        let chat = ChatService::new(
            self.sessions.clone(),
            self.links.clone(),
            pipeline.clone(),
            self.messages.clone(),
            engine,
            TEST_BASE_URL.to_string(),
        );
        Arc::new(AppState {
            chat,
            pipeline,
            links: self.links.clone(),
            sessions: self.sessions.clone(),
        })
    }
}
