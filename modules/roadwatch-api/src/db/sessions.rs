use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::warn;

use roadwatch_chat::{ConversationState, SaveOutcome, Session, SessionStore};
use roadwatch_common::{Language, ReportType};

#[derive(sqlx::FromRow)]
struct SessionRow {
    user_id: String,
    state: String,
    last_option: Option<String>,
    language: String,
    user_name: Option<String>,
    last_interaction: DateTime<Utc>,
    last_description: Option<String>,
    last_photo_url: Option<String>,
    version: i64,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        let state = ConversationState::parse(&row.state).unwrap_or_else(|| {
            warn!(state = row.state.as_str(), "Unknown stored state, restarting conversation");
            ConversationState::LanguageSelect
        });
        Session {
            user_id: row.user_id,
            state,
            last_option: row.last_option.as_deref().and_then(ReportType::from_slug),
            language: Language::from_code(&row.language).unwrap_or_default(),
            user_name: row.user_name,
            last_interaction: row.last_interaction,
            last_description: row.last_description,
            last_photo_url: row.last_photo_url,
            version: row.version,
        }
    }
}

/// Conversation sessions in `chat_sessions`, written with a version check.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn load(&self, user_id: &str) -> Result<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT user_id, state, last_option, language, user_name, last_interaction,
                   last_description, last_photo_url, version
            FROM chat_sessions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Session::from))
    }

    async fn save(&self, session: &Session) -> Result<SaveOutcome> {
        let last_option = session.last_option.map(|o| o.slug());

        let result = if session.version == 0 {
            sqlx::query(
                r#"
                INSERT INTO chat_sessions (user_id, state, last_option, language, user_name,
                    last_interaction, last_description, last_photo_url, version)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 1)
                ON CONFLICT (user_id) DO NOTHING
                "#,
            )
            .bind(&session.user_id)
            .bind(session.state.as_str())
            .bind(last_option)
            .bind(session.language.code())
            .bind(&session.user_name)
            .bind(session.last_interaction)
            .bind(&session.last_description)
            .bind(&session.last_photo_url)
            .execute(&self.pool)
            .await?
        } else {
            sqlx::query(
                r#"
                UPDATE chat_sessions
                SET state = $2, last_option = $3, language = $4, user_name = $5,
                    last_interaction = $6, last_description = $7, last_photo_url = $8,
                    version = version + 1
                WHERE user_id = $1 AND version = $9
                "#,
            )
            .bind(&session.user_id)
            .bind(session.state.as_str())
            .bind(last_option)
            .bind(session.language.code())
            .bind(&session.user_name)
            .bind(session.last_interaction)
            .bind(&session.last_description)
            .bind(&session.last_photo_url)
            .bind(session.version)
            .execute(&self.pool)
            .await?
        };

        if result.rows_affected() == 1 {
            Ok(SaveOutcome::Saved(session.version + 1))
        } else {
            Ok(SaveOutcome::Conflict)
        }
    }
}
