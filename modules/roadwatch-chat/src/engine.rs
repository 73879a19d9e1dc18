//! Conversation state machine.
//!
//! `transition` maps (session, inbound message, now) to the next session, a
//! declarative reply and the side effects the caller must run. It performs no
//! I/O; rendering and effect execution live in the API crate.

use chrono::{DateTime, Duration, Utc};

use roadwatch_common::{CaptureMode, GeoLocation, Language, ReportDraft, ReportType};

use crate::join::parse_join_details;
use crate::session::Session;
use crate::state::ConversationState;

const MAX_NAME_CHARS: usize = 80;

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub capture_mode: CaptureMode,
    pub session_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capture_mode: CaptureMode::WebForm,
            session_timeout: Duration::hours(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Media {
    pub url: String,
    pub content_type: Option<String>,
}

/// One inbound chat event, already decoded from the transport payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundMessage {
    pub text: String,
    pub media: Option<Media>,
    pub location: Option<GeoLocation>,
}

impl InboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// What to say back. Rendered into localized text by the caller, which may
/// need effect results (e.g. the issued link) to do so.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Nothing beyond what the effects send themselves.
    None,
    LanguagePrompt,
    NameRequest,
    /// Confirmation followed by the menu.
    NameConfirmed { name: String },
    /// Greeting followed by the menu.
    WelcomeBack { name: String },
    Menu,
    CaptureLink(ReportType),
    JoinLink,
    PhotoPrompt(ReportType),
    LocationHint,
    SuggestionPrompt,
    JoinPrompt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    IssueCaptureLink(ReportType),
    IssueJoinLink,
    Submit(ReportDraft),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub session: Session,
    pub reply: Reply,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn reply(session: Session, reply: Reply) -> Self {
        Self {
            session,
            reply,
            effects: Vec::new(),
        }
    }

    fn with_effect(session: Session, reply: Reply, effect: Effect) -> Self {
        Self {
            session,
            reply,
            effects: vec![effect],
        }
    }

    pub fn state(&self) -> ConversationState {
        self.session.state
    }
}

/// Total transition function over every (state, message) pair.
pub fn transition(
    current: &Session,
    message: &InboundMessage,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Transition {
    let mut next = current.clone();
    next.last_interaction = now;

    let text = message.text.trim();
    let command = text.to_lowercase();

    // Global commands work from any state, expired or not.
    if command == "reset" {
        next.state = ConversationState::LanguageSelect;
        next.clear_pending();
        return Transition::reply(next, Reply::LanguagePrompt);
    }
    if command == "menu" {
        next.state = ConversationState::Menu;
        next.clear_pending();
        return Transition::reply(next, Reply::Menu);
    }

    if current.version > 0 && current.is_expired(now, config.session_timeout) {
        next.reset_after_timeout();
        let reply = match &next.user_name {
            Some(name) => Reply::WelcomeBack { name: name.clone() },
            None => Reply::LanguagePrompt,
        };
        return Transition::reply(next, reply);
    }

    match current.state {
        ConversationState::LanguageSelect => on_language_select(next, text),
        ConversationState::NameCollection => on_name_collection(next, text),
        ConversationState::Menu => on_menu(next, text, config.capture_mode),
        ConversationState::AwaitingReport => on_awaiting_report(next, text, message),
        ConversationState::AwaitingLocation => on_awaiting_location(next, message),
        ConversationState::AwaitingSuggestionText => on_awaiting_suggestion(next, text),
        ConversationState::AwaitingJoin => on_awaiting_join(next, text),
        ConversationState::JoinTeamLinkSent => back_to_menu(next),
    }
}

fn on_language_select(mut next: Session, text: &str) -> Transition {
    let Some(language) = Language::from_choice(text) else {
        return Transition::reply(next, Reply::LanguagePrompt);
    };
    next.language = language;

    match next.user_name.clone() {
        Some(name) => {
            next.state = ConversationState::Menu;
            Transition::reply(next, Reply::WelcomeBack { name })
        }
        None => {
            next.state = ConversationState::NameCollection;
            Transition::reply(next, Reply::NameRequest)
        }
    }
}

fn on_name_collection(mut next: Session, text: &str) -> Transition {
    if text.is_empty() {
        return Transition::reply(next, Reply::NameRequest);
    }
    let name: String = text.chars().take(MAX_NAME_CHARS).collect();
    next.user_name = Some(name.clone());
    next.state = ConversationState::Menu;
    Transition::reply(next, Reply::NameConfirmed { name })
}

fn on_menu(mut next: Session, text: &str, mode: CaptureMode) -> Transition {
    let Some(option) = ReportType::from_menu_code(text) else {
        return back_to_menu(next);
    };
    next.clear_pending();
    next.last_option = Some(option);

    match (mode, option) {
        (CaptureMode::WebForm, ReportType::JoinRequest) => {
            next.state = ConversationState::JoinTeamLinkSent;
            Transition::with_effect(next, Reply::JoinLink, Effect::IssueJoinLink)
        }
        (CaptureMode::WebForm, report_type) => {
            next.state = ConversationState::AwaitingReport;
            Transition::with_effect(
                next,
                Reply::CaptureLink(report_type),
                Effect::IssueCaptureLink(report_type),
            )
        }
        (CaptureMode::Chat, ReportType::Suggestion) => {
            next.state = ConversationState::AwaitingSuggestionText;
            Transition::reply(next, Reply::SuggestionPrompt)
        }
        (CaptureMode::Chat, ReportType::JoinRequest) => {
            next.state = ConversationState::AwaitingJoin;
            Transition::reply(next, Reply::JoinPrompt)
        }
        (CaptureMode::Chat, report_type) => {
            next.state = ConversationState::AwaitingReport;
            Transition::reply(next, Reply::PhotoPrompt(report_type))
        }
    }
}

fn on_awaiting_report(mut next: Session, text: &str, message: &InboundMessage) -> Transition {
    let pending = next.last_option.filter(ReportType::requires_location);

    match (&message.media, pending) {
        (Some(media), Some(_)) => {
            next.last_photo_url = Some(media.url.clone());
            next.last_description = (!text.is_empty()).then(|| text.to_string());
            next.state = ConversationState::AwaitingLocation;
            Transition::reply(next, Reply::LocationHint)
        }
        // Anything else abandons the in-progress capture.
        _ => back_to_menu(next),
    }
}

fn on_awaiting_location(mut next: Session, message: &InboundMessage) -> Transition {
    let Some(location) = message.location.clone() else {
        return Transition::reply(next, Reply::LocationHint);
    };
    let Some(report_type) = next.last_option.filter(ReportType::requires_location) else {
        return back_to_menu(next);
    };

    let draft = ReportDraft {
        user_id: next.user_id.clone(),
        user_name: next.user_name.clone(),
        language: next.language,
        report_type,
        description: next.last_description.clone().unwrap_or_default(),
        photo_url: next.last_photo_url.clone(),
        location: Some(location),
        join_details: None,
    };

    next.clear_pending();
    next.state = ConversationState::Menu;
    Transition::with_effect(next, Reply::None, Effect::Submit(draft))
}

fn on_awaiting_suggestion(mut next: Session, text: &str) -> Transition {
    if text.is_empty() {
        return Transition::reply(next, Reply::SuggestionPrompt);
    }

    let draft = ReportDraft {
        user_id: next.user_id.clone(),
        user_name: next.user_name.clone(),
        language: next.language,
        report_type: ReportType::Suggestion,
        description: text.to_string(),
        photo_url: None,
        location: None,
        join_details: None,
    };

    next.clear_pending();
    next.state = ConversationState::Menu;
    Transition::with_effect(next, Reply::None, Effect::Submit(draft))
}

fn on_awaiting_join(mut next: Session, text: &str) -> Transition {
    if text.is_empty() {
        return Transition::reply(next, Reply::JoinPrompt);
    }

    let mut details = parse_join_details(text);
    // The applicant is writing from their own number and may already have told us their name.
    if details.name.is_empty() {
        details.name = next.user_name.clone().unwrap_or_default();
    }
    if details.phone.is_empty() {
        details.phone = format!("+{}", next.user_id);
    }

    let draft = ReportDraft {
        user_id: next.user_id.clone(),
        user_name: next.user_name.clone(),
        language: next.language,
        report_type: ReportType::JoinRequest,
        description: text.to_string(),
        photo_url: None,
        location: None,
        join_details: Some(details),
    };

    next.clear_pending();
    next.state = ConversationState::Menu;
    Transition::with_effect(next, Reply::None, Effect::Submit(draft))
}

fn back_to_menu(mut next: Session) -> Transition {
    next.clear_pending();
    next.state = ConversationState::Menu;
    Transition::reply(next, Reply::Menu)
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: &str = "919876543210";

    fn session_in(state: ConversationState) -> Session {
        let mut s = Session::new(USER, Utc::now());
        s.state = state;
        s.version = 3;
        s.user_name = Some("Asha".to_string());
        s
    }

    fn web() -> EngineConfig {
        EngineConfig::default()
    }

    fn chat() -> EngineConfig {
        EngineConfig {
            capture_mode: CaptureMode::Chat,
            ..EngineConfig::default()
        }
    }

    fn run(session: &Session, message: InboundMessage, config: &EngineConfig) -> Transition {
        transition(session, &message, config, Utc::now())
    }

    #[test]
    fn reset_is_global_and_case_insensitive() {
        for state in ConversationState::ALL {
            let t = run(&session_in(state), InboundMessage::text("ReSeT"), &web());
            assert_eq!(t.state(), ConversationState::LanguageSelect, "from {state}");
            assert_eq!(t.reply, Reply::LanguagePrompt);
            assert!(t.effects.is_empty());
        }
    }

    #[test]
    fn menu_is_global() {
        for state in ConversationState::ALL {
            let t = run(&session_in(state), InboundMessage::text("menu"), &web());
            assert_eq!(t.state(), ConversationState::Menu, "from {state}");
            assert_eq!(t.reply, Reply::Menu);
        }
    }

    #[test]
    fn language_choice_without_name_asks_for_name() {
        let fresh = Session::new(USER, Utc::now());
        let t = run(&fresh, InboundMessage::text("1"), &web());
        assert_eq!(t.session.language, Language::En);
        assert_eq!(t.state(), ConversationState::NameCollection);
        assert_eq!(t.reply, Reply::NameRequest);
    }

    #[test]
    fn language_choice_with_known_name_goes_to_menu() {
        let t = run(&session_in(ConversationState::LanguageSelect), InboundMessage::text("2"), &web());
        assert_eq!(t.session.language, Language::Mr);
        assert_eq!(t.state(), ConversationState::Menu);
        assert_eq!(t.reply, Reply::WelcomeBack { name: "Asha".to_string() });
    }

    #[test]
    fn invalid_language_choice_repeats_prompt() {
        let fresh = Session::new(USER, Utc::now());
        let t = run(&fresh, InboundMessage::text("hello"), &web());
        assert_eq!(t.state(), ConversationState::LanguageSelect);
        assert_eq!(t.reply, Reply::LanguagePrompt);
    }

    #[test]
    fn name_is_stored_and_menu_follows() {
        let mut s = Session::new(USER, Utc::now());
        s.state = ConversationState::NameCollection;
        let t = run(&s, InboundMessage::text("  Ravi Kulkarni "), &web());
        assert_eq!(t.session.user_name.as_deref(), Some("Ravi Kulkarni"));
        assert_eq!(t.state(), ConversationState::Menu);
        assert_eq!(t.reply, Reply::NameConfirmed { name: "Ravi Kulkarni".to_string() });
    }

    #[test]
    fn web_menu_options_issue_capture_links() {
        for code in ["1", "2", "3", "4", "5", "6", "7"] {
            let t = run(&session_in(ConversationState::Menu), InboundMessage::text(code), &web());
            let expected = ReportType::from_menu_code(code).unwrap();
            assert_eq!(t.state(), ConversationState::AwaitingReport);
            assert_eq!(t.session.last_option, Some(expected));
            assert_eq!(t.effects, vec![Effect::IssueCaptureLink(expected)]);
            assert_eq!(t.reply, Reply::CaptureLink(expected));
        }
    }

    #[test]
    fn web_menu_join_issues_join_link() {
        let t = run(&session_in(ConversationState::Menu), InboundMessage::text("8"), &web());
        assert_eq!(t.state(), ConversationState::JoinTeamLinkSent);
        assert_eq!(t.effects, vec![Effect::IssueJoinLink]);
    }

    #[test]
    fn unknown_menu_option_repeats_menu() {
        let t = run(&session_in(ConversationState::Menu), InboundMessage::text("42"), &web());
        assert_eq!(t.state(), ConversationState::Menu);
        assert_eq!(t.reply, Reply::Menu);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn second_text_abandons_pending_report() {
        let mut s = session_in(ConversationState::AwaitingReport);
        s.last_option = Some(ReportType::Accident);
        let t = run(&s, InboundMessage::text("never mind"), &web());
        assert_eq!(t.state(), ConversationState::Menu);
        assert!(t.session.last_option.is_none());
        assert!(t.effects.is_empty());
    }

    #[test]
    fn chat_capture_collects_photo_then_location() {
        let t = run(&session_in(ConversationState::Menu), InboundMessage::text("3"), &chat());
        assert_eq!(t.state(), ConversationState::AwaitingReport);
        assert_eq!(t.reply, Reply::PhotoPrompt(ReportType::IllegalParking));

        let photo = InboundMessage {
            text: "Car blocking the bus stop".to_string(),
            media: Some(Media {
                url: "https://media.example/abc.jpg".to_string(),
                content_type: Some("image/jpeg".to_string()),
            }),
            location: None,
        };
        let t = transition(&t.session, &photo, &chat(), Utc::now());
        assert_eq!(t.state(), ConversationState::AwaitingLocation);
        assert_eq!(t.reply, Reply::LocationHint);

        // Text without a location keeps waiting.
        let t = transition(&t.session, &InboundMessage::text("where?"), &chat(), Utc::now());
        assert_eq!(t.state(), ConversationState::AwaitingLocation);
        assert_eq!(t.reply, Reply::LocationHint);

        let location = InboundMessage {
            location: Some(GeoLocation {
                lat: 18.62,
                lng: 73.80,
                address: Some("Nigdi".to_string()),
            }),
            ..Default::default()
        };
        let t = transition(&t.session, &location, &chat(), Utc::now());
        assert_eq!(t.state(), ConversationState::Menu);
        assert!(t.session.last_photo_url.is_none());
        let [Effect::Submit(draft)] = t.effects.as_slice() else {
            panic!("expected a single submit effect, got {:?}", t.effects);
        };
        assert_eq!(draft.report_type, ReportType::IllegalParking);
        assert_eq!(draft.description, "Car blocking the bus stop");
        assert_eq!(draft.photo_url.as_deref(), Some("https://media.example/abc.jpg"));
        assert_eq!(draft.location.as_ref().map(|l| l.lat), Some(18.62));
    }

    #[test]
    fn chat_suggestion_is_submitted_without_location() {
        let t = run(&session_in(ConversationState::Menu), InboundMessage::text("7"), &chat());
        assert_eq!(t.state(), ConversationState::AwaitingSuggestionText);

        let t = transition(&t.session, &InboundMessage::text("More signals at Chinchwad"), &chat(), Utc::now());
        assert_eq!(t.state(), ConversationState::Menu);
        let [Effect::Submit(draft)] = t.effects.as_slice() else {
            panic!("expected submit");
        };
        assert_eq!(draft.report_type, ReportType::Suggestion);
        assert!(draft.location.is_none());
    }

    #[test]
    fn chat_join_parses_labels_and_falls_back_to_session() {
        let t = run(&session_in(ConversationState::Menu), InboundMessage::text("8"), &chat());
        assert_eq!(t.state(), ConversationState::AwaitingJoin);

        let t = transition(
            &t.session,
            &InboundMessage::text("Email: asha@example.com\nLocation: Akurdi"),
            &chat(),
            Utc::now(),
        );
        assert_eq!(t.state(), ConversationState::Menu);
        let [Effect::Submit(draft)] = t.effects.as_slice() else {
            panic!("expected submit");
        };
        let details = draft.join_details.as_ref().unwrap();
        assert_eq!(details.name, "Asha");
        assert_eq!(details.email, "asha@example.com");
        assert_eq!(details.phone, format!("+{USER}"));
        assert_eq!(details.location, "Akurdi");
    }

    #[test]
    fn join_link_sent_falls_back_to_menu() {
        let t = run(&session_in(ConversationState::JoinTeamLinkSent), InboundMessage::text("ok"), &web());
        assert_eq!(t.state(), ConversationState::Menu);
        assert_eq!(t.reply, Reply::Menu);
    }

    #[test]
    fn expired_session_with_name_lands_on_menu() {
        let now = Utc::now();
        let mut s = session_in(ConversationState::AwaitingLocation);
        s.last_option = Some(ReportType::Accident);
        s.last_interaction = now - Duration::minutes(61);

        let t = transition(&s, &InboundMessage::text("3"), &web(), now);
        assert_eq!(t.state(), ConversationState::Menu);
        assert_eq!(t.reply, Reply::WelcomeBack { name: "Asha".to_string() });
        assert!(t.effects.is_empty());
        assert_eq!(t.session.last_interaction, now);
    }

    #[test]
    fn expired_session_without_name_restarts_language_select() {
        let now = Utc::now();
        let mut s = session_in(ConversationState::Menu);
        s.user_name = None;
        s.last_interaction = now - Duration::hours(2);

        let t = transition(&s, &InboundMessage::text("1"), &web(), now);
        assert_eq!(t.state(), ConversationState::LanguageSelect);
        assert_eq!(t.reply, Reply::LanguagePrompt);
    }

    #[test]
    fn transition_is_total() {
        let messages = [
            InboundMessage::text(""),
            InboundMessage::text("1"),
            InboundMessage::text("8"),
            InboundMessage::text("anything"),
            InboundMessage {
                location: Some(GeoLocation { lat: 0.0, lng: 0.0, address: None }),
                ..Default::default()
            },
        ];
        for config in [web(), chat()] {
            for state in ConversationState::ALL {
                for message in &messages {
                    let t = transition(&session_in(state), message, &config, Utc::now());
                    assert!(t.effects.len() <= 1);
                }
            }
        }
    }
}
