//! Chat front door: load the session, run the state machine, save with
//! compare-and-swap, then execute effects and send the rendered reply.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info, warn};
use url::Url;

use roadwatch_chat::{
    transition, CaptureLink, ConversationState, Effect, EngineConfig, InboundMessage,
    LinkTokenGuard, Reply, SaveOutcome, Session, SessionStore, Transition,
};
use roadwatch_common::text::report_label;
use roadwatch_common::{
    chat_address, localized, normalize_user_id, Language, ReportType, RoadWatchError, TextKey,
};

use crate::notify::MessageSender;
use crate::pipeline::ReportIngestionPipeline;

/// Attempts per inbound message before giving up on a contended session.
const MAX_SAVE_ATTEMPTS: usize = 3;

pub struct ChatService {
    sessions: Arc<dyn SessionStore>,
    links: Arc<LinkTokenGuard>,
    pipeline: Arc<ReportIngestionPipeline>,
    messages: Arc<dyn MessageSender>,
    engine: EngineConfig,
    public_base_url: String,
}

impl ChatService {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        links: Arc<LinkTokenGuard>,
        pipeline: Arc<ReportIngestionPipeline>,
        messages: Arc<dyn MessageSender>,
        engine: EngineConfig,
        public_base_url: String,
    ) -> Self {
        Self {
            sessions,
            links,
            pipeline,
            messages,
            engine,
            public_base_url,
        }
    }

    /// Handle one inbound event from `from` (any address form). Returns the
    /// state the conversation ended in.
    pub async fn handle(&self, from: &str, message: InboundMessage) -> Result<ConversationState> {
        let user_id = normalize_user_id(from);
        if user_id.is_empty() {
            warn!("Inbound message without a usable sender, ignoring");
            return Ok(ConversationState::LanguageSelect);
        }

        let step = self.advance(&user_id, &message).await?;
        debug!(
            state = %step.session.state,
            effects = step.effects.len(),
            "Session advanced"
        );

        let mut link_url = None;
        for effect in step.effects {
            match effect {
                Effect::IssueCaptureLink(report_type) => {
                    link_url = self.issue_link(&user_id, report_type, "report").await;
                }
                Effect::IssueJoinLink => {
                    link_url = self.issue_link(&user_id, ReportType::JoinRequest, "join").await;
                }
                Effect::Submit(draft) => {
                    // Outcome messages are sent by the pipeline.
                    match self.pipeline.submit(draft).await {
                        Ok(accepted) => {
                            debug!(report_id = %accepted.report_id, "Chat report accepted");
                        }
                        Err(rejection) => {
                            debug!(reason = rejection.reason.code(), "Chat report rejected");
                        }
                    }
                }
            }
        }

        let bodies = render_reply(
            &step.reply,
            step.session.language,
            link_url.as_deref(),
            self.links.ttl_minutes(),
        );
        let recipient = chat_address(&user_id);
        for body in bodies {
            if let Err(e) = self.messages.send(&recipient, &body).await {
                warn!(error = %e, "Failed to send chat reply");
            }
        }

        Ok(step.session.state)
    }

    /// Load, transition and save, retrying on a version conflict so that two
    /// concurrent messages from one user cannot both win.
    async fn advance(&self, user_id: &str, message: &InboundMessage) -> Result<Transition> {
        for attempt in 1..=MAX_SAVE_ATTEMPTS {
            let now = Utc::now();
            let current = self
                .sessions
                .load(user_id)
                .await?
                .unwrap_or_else(|| Session::new(user_id, now));

            let step = transition(&current, message, &self.engine, now);

            match self.sessions.save(&step.session).await? {
                SaveOutcome::Saved(version) => {
                    let mut step = step;
                    step.session.version = version;
                    return Ok(step);
                }
                SaveOutcome::Conflict => {
                    debug!(attempt, "Session changed underneath us, retrying");
                }
            }
        }

        warn!(attempts = MAX_SAVE_ATTEMPTS, "Giving up on contended session");
        Err(RoadWatchError::SessionConflict(user_id.to_string()).into())
    }

    async fn issue_link(&self, user_id: &str, report_type: ReportType, path: &str) -> Option<String> {
        let link = match self.links.issue(user_id, report_type).await {
            Ok(link) => link,
            Err(e) => {
                warn!(error = %e, "Failed to issue capture link");
                return None;
            }
        };
        match link_url(&self.public_base_url, path, &link) {
            Ok(url) => {
                info!(report_type = %report_type, "Capture link sent");
                Some(url)
            }
            Err(e) => {
                warn!(error = %e, "PUBLIC_BASE_URL is not a valid base URL");
                None
            }
        }
    }
}

/// Build `<base>/<path>?link=..&type=..&user=..` for the web form.
pub fn link_url(base: &str, path: &str, link: &CaptureLink) -> Result<String> {
    let mut base = Url::parse(base)?;
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    let mut url = base.join(path)?;
    url.query_pairs_mut()
        .append_pair("link", &link.link_id)
        .append_pair("type", link.report_type.slug())
        .append_pair("user", &link.user_id);
    Ok(url.to_string())
}

/// Turn a declarative reply into the chat messages to send, in order.
pub fn render_reply(
    reply: &Reply,
    language: Language,
    link_url: Option<&str>,
    ttl_minutes: i64,
) -> Vec<String> {
    let text = |key: TextKey, args: &[&str]| localized(key, language, args);
    let minutes = ttl_minutes.to_string();

    match reply {
        Reply::None => Vec::new(),
        Reply::LanguagePrompt => vec![text(TextKey::LanguagePrompt, &[])],
        Reply::NameRequest => vec![text(TextKey::NameRequest, &[])],
        Reply::NameConfirmed { name } => vec![
            text(TextKey::NameConfirmed, &[name.as_str()]),
            text(TextKey::Menu, &[]),
        ],
        Reply::WelcomeBack { name } => vec![
            text(TextKey::WelcomeBack, &[name.as_str()]),
            text(TextKey::Menu, &[]),
        ],
        Reply::Menu => vec![text(TextKey::Menu, &[])],
        Reply::CaptureLink(report_type) => match link_url {
            Some(url) => vec![text(
                TextKey::CaptureLink,
                &[report_label(*report_type, language), url, minutes.as_str()],
            )],
            None => vec![text(TextKey::LinkUnavailable, &[])],
        },
        Reply::JoinLink => match link_url {
            Some(url) => vec![text(TextKey::JoinLink, &[url, minutes.as_str()])],
            None => vec![text(TextKey::LinkUnavailable, &[])],
        },
        Reply::PhotoPrompt(report_type) => {
            vec![text(TextKey::PhotoPrompt, &[report_label(*report_type, language)])]
        }
        Reply::LocationHint => vec![text(TextKey::LocationHint, &[])],
        Reply::SuggestionPrompt => vec![text(TextKey::SuggestionPrompt, &[])],
        Reply::JoinPrompt => vec![text(TextKey::JoinPrompt, &[])],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link() -> CaptureLink {
        CaptureLink {
            link_id: "abc123".to_string(),
            user_id: "919876543210".to_string(),
            report_type: ReportType::IllegalParking,
            created_at: Utc::now(),
            used: false,
            used_at: None,
        }
    }

    #[test]
    fn link_url_keeps_base_path() {
        let url = link_url("https://report.example.org/app", "report", &link()).unwrap();
        assert!(url.starts_with("https://report.example.org/app/report?"));
        assert!(url.contains("link=abc123"));
        assert!(url.contains("type=illegal_parking"));
        assert!(url.contains("user=919876543210"));
    }

    #[test]
    fn link_url_rejects_relative_base() {
        assert!(link_url("not a url", "report", &link()).is_err());
    }

    #[test]
    fn name_confirmation_is_followed_by_menu() {
        let bodies = render_reply(
            &Reply::NameConfirmed {
                name: "Asha".to_string(),
            },
            Language::En,
            None,
            5,
        );
        assert_eq!(bodies.len(), 2);
        assert!(bodies[0].contains("Asha"));
        assert_eq!(bodies[1], localized(TextKey::Menu, Language::En, &[]));
    }

    #[test]
    fn capture_link_without_url_apologises() {
        let bodies = render_reply(&Reply::CaptureLink(ReportType::Accident), Language::Mr, None, 5);
        assert_eq!(bodies, vec![localized(TextKey::LinkUnavailable, Language::Mr, &[])]);
    }

    #[test]
    fn capture_link_mentions_url_and_validity() {
        let bodies = render_reply(
            &Reply::CaptureLink(ReportType::Accident),
            Language::En,
            Some("https://x.test/report?link=1"),
            5,
        );
        assert!(bodies[0].contains("https://x.test/report?link=1"));
        assert!(bodies[0].contains('5'));
    }
}
