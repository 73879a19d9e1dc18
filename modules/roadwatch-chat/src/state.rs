use serde::{Deserialize, Serialize};

/// Where a user is in the conversation. There is no terminal state: every
/// completed flow returns to `Menu`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationState {
    #[default]
    LanguageSelect,
    NameCollection,
    Menu,
    AwaitingReport,
    AwaitingLocation,
    AwaitingSuggestionText,
    AwaitingJoin,
    JoinTeamLinkSent,
}

impl ConversationState {
    pub const ALL: [ConversationState; 8] = [
        ConversationState::LanguageSelect,
        ConversationState::NameCollection,
        ConversationState::Menu,
        ConversationState::AwaitingReport,
        ConversationState::AwaitingLocation,
        ConversationState::AwaitingSuggestionText,
        ConversationState::AwaitingJoin,
        ConversationState::JoinTeamLinkSent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::LanguageSelect => "LANGUAGE_SELECT",
            ConversationState::NameCollection => "NAME_COLLECTION",
            ConversationState::Menu => "MENU",
            ConversationState::AwaitingReport => "AWAITING_REPORT",
            ConversationState::AwaitingLocation => "AWAITING_LOCATION",
            ConversationState::AwaitingSuggestionText => "AWAITING_SUGGESTION_TEXT",
            ConversationState::AwaitingJoin => "AWAITING_JOIN",
            ConversationState::JoinTeamLinkSent => "JOIN_TEAM_LINK_SENT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
