use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Language ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    En,
    Mr,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Mr => "mr",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Language::En),
            "mr" => Some(Language::Mr),
            _ => None,
        }
    }

    /// Language-selection menu: "1" English, "2" Marathi.
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Language::En),
            "2" => Some(Language::Mr),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

// --- Report categories ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Accident,
    TrafficCongestion,
    IllegalParking,
    SignalMalfunction,
    RoadDamage,
    RashDriving,
    Suggestion,
    JoinRequest,
}

/// Menu code → category. The chat menu and the capture form both go through this table.
pub const REPORT_TYPE_CODES: [(&str, ReportType); 8] = [
    ("1", ReportType::Accident),
    ("2", ReportType::TrafficCongestion),
    ("3", ReportType::IllegalParking),
    ("4", ReportType::SignalMalfunction),
    ("5", ReportType::RoadDamage),
    ("6", ReportType::RashDriving),
    ("7", ReportType::Suggestion),
    ("8", ReportType::JoinRequest),
];

impl ReportType {
    pub fn from_menu_code(code: &str) -> Option<Self> {
        let code = code.trim();
        REPORT_TYPE_CODES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, t)| *t)
    }

    pub fn menu_code(&self) -> &'static str {
        REPORT_TYPE_CODES
            .iter()
            .find(|(_, t)| t == self)
            .map(|(c, _)| *c)
            .unwrap_or_default()
    }

    pub fn slug(&self) -> &'static str {
        match self {
            ReportType::Accident => "accident",
            ReportType::TrafficCongestion => "traffic_congestion",
            ReportType::IllegalParking => "illegal_parking",
            ReportType::SignalMalfunction => "signal_malfunction",
            ReportType::RoadDamage => "road_damage",
            ReportType::RashDriving => "rash_driving",
            ReportType::Suggestion => "suggestion",
            ReportType::JoinRequest => "join_request",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        REPORT_TYPE_CODES
            .iter()
            .map(|(_, t)| *t)
            .find(|t| t.slug() == slug)
    }

    /// Incident categories are geo-classified and routed to division officers.
    pub fn requires_location(&self) -> bool {
        !matches!(self, ReportType::Suggestion | ReportType::JoinRequest)
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.slug())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[default]
    Pending,
    InProgress,
    Resolved,
    Rejected,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::InProgress => "in_progress",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Rejected => "rejected",
        }
    }
}

/// How the chat hands a user off to report capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureMode {
    /// Issue single-use capture links to the web form.
    #[default]
    WebForm,
    /// Collect photo, location, suggestion text and join details inside the chat.
    Chat,
}

impl CaptureMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "web" | "webform" | "web_form" => Some(CaptureMode::WebForm),
            "chat" => Some(CaptureMode::Chat),
            _ => None,
        }
    }
}

// --- Geo / division types ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lng: f64,
    pub address: Option<String>,
}

/// Roster entry. Accepts both snake_case and the camelCase shape the admin
/// tooling writes. Entries stored without an id decode with `Uuid::nil()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Officer {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    #[serde(default, alias = "alternatePhone")]
    pub alternate_phone: Option<String>,
    #[serde(default = "default_true", alias = "isActive")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Division {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub email: Option<String>,
    /// Outer ring as `[lng, lat]` vertices. Holes are not modelled.
    pub boundary: Vec<[f64; 2]>,
    pub officers: Vec<Officer>,
}

impl Division {
    pub fn active_officers(&self) -> impl Iterator<Item = &Officer> {
        self.officers.iter().filter(|o| o.is_active)
    }
}

// --- Reports ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

/// One attempt to alert an officer contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficerNotification {
    pub officer_id: Uuid,
    pub phone: String,
    pub sent_at: DateTime<Utc>,
    pub delivery_status: DeliveryStatus,
    pub provider_message_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
}

/// A submission before validation, division resolution and persistence.
/// Produced by the chat engine and by the capture-form handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDraft {
    pub user_id: String,
    pub user_name: Option<String>,
    pub language: Language,
    pub report_type: ReportType,
    pub description: String,
    pub photo_url: Option<String>,
    pub location: Option<GeoLocation>,
    pub join_details: Option<JoinDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub user_id: String,
    pub user_name: Option<String>,
    pub report_type: ReportType,
    pub description: String,
    pub photo_url: Option<String>,
    pub location: Option<GeoLocation>,
    pub status: ReportStatus,
    pub division_id: Option<Uuid>,
    pub division_name: Option<String>,
    pub division_notified: bool,
    pub officers_notified: Vec<OfficerNotification>,
    pub join_details: Option<JoinDetails>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_codes_round_trip_through_table() {
        for (code, report_type) in REPORT_TYPE_CODES {
            assert_eq!(ReportType::from_menu_code(code), Some(report_type));
            assert_eq!(report_type.menu_code(), code);
            assert_eq!(ReportType::from_slug(report_type.slug()), Some(report_type));
        }
    }

    #[test]
    fn unknown_menu_code_is_none() {
        assert_eq!(ReportType::from_menu_code("9"), None);
        assert_eq!(ReportType::from_menu_code("one"), None);
        assert_eq!(ReportType::from_menu_code(""), None);
    }

    #[test]
    fn only_incidents_require_location() {
        assert!(ReportType::Accident.requires_location());
        assert!(ReportType::RashDriving.requires_location());
        assert!(!ReportType::Suggestion.requires_location());
        assert!(!ReportType::JoinRequest.requires_location());
    }

    #[test]
    fn language_choice() {
        assert_eq!(Language::from_choice("1"), Some(Language::En));
        assert_eq!(Language::from_choice(" 2 "), Some(Language::Mr));
        assert_eq!(Language::from_choice("3"), None);
    }

    #[test]
    fn capture_mode_parse() {
        assert_eq!(CaptureMode::parse("web"), Some(CaptureMode::WebForm));
        assert_eq!(CaptureMode::parse("CHAT"), Some(CaptureMode::Chat));
        assert_eq!(CaptureMode::parse("sms"), None);
    }
}
