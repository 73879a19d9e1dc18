use std::env;

use tracing::info;

use crate::types::CaptureMode;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Twilio (WhatsApp channel)
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_from_number: String,

    // Outbound collaborators (disabled when unset)
    pub email_webhook_url: Option<String>,
    pub object_store_url: Option<String>,

    // Web server
    pub web_host: String,
    pub web_port: u16,
    /// Base URL of the capture form, used to build capture and join links.
    pub public_base_url: String,
    pub allowed_origins: Vec<String>,

    // Conversation
    pub capture_mode: CaptureMode,
    pub session_timeout_minutes: i64,
    pub link_ttl_minutes: i64,

    // Geo + routing
    pub polygon_cache_ttl_hours: i64,
    pub max_officers_notified: usize,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            twilio_account_sid: required_env("TWILIO_ACCOUNT_SID"),
            twilio_auth_token: required_env("TWILIO_AUTH_TOKEN"),
            twilio_from_number: required_env("TWILIO_FROM_NUMBER"),
            email_webhook_url: optional_env("EMAIL_WEBHOOK_URL"),
            object_store_url: optional_env("OBJECT_STORE_URL"),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: parsed_env("WEB_PORT", 3000),
            public_base_url: required_env("PUBLIC_BASE_URL"),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .filter(|s| !s.is_empty())
                .map(|s| s.trim().to_string())
                .collect(),
            capture_mode: env::var("CAPTURE_MODE")
                .ok()
                .map(|v| {
                    CaptureMode::parse(&v)
                        .unwrap_or_else(|| panic!("CAPTURE_MODE must be 'web' or 'chat', got '{v}'"))
                })
                .unwrap_or_default(),
            session_timeout_minutes: parsed_env("SESSION_TIMEOUT_MINUTES", 60),
            link_ttl_minutes: parsed_env("LINK_TTL_MINUTES", 5),
            polygon_cache_ttl_hours: parsed_env("POLYGON_CACHE_TTL_HOURS", 24),
            max_officers_notified: parsed_env("MAX_OFFICERS_NOTIFIED", 2),
        }
    }

    /// Log the effective configuration without secrets.
    pub fn log_redacted(&self) {
        info!(
            web_host = self.web_host.as_str(),
            web_port = self.web_port,
            public_base_url = self.public_base_url.as_str(),
            twilio_from = self.twilio_from_number.as_str(),
            email_enabled = self.email_webhook_url.is_some(),
            object_store_enabled = self.object_store_url.is_some(),
            capture_mode = ?self.capture_mode,
            session_timeout_minutes = self.session_timeout_minutes,
            link_ttl_minutes = self.link_ttl_minutes,
            polygon_cache_ttl_hours = self.polygon_cache_ttl_hours,
            max_officers_notified = self.max_officers_notified,
            "Configuration loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(v) => v
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number, got '{v}'")),
        Err(_) => default,
    }
}
