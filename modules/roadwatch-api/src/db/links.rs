use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use roadwatch_chat::{CaptureLink, CaptureLinkStore};
use roadwatch_common::{ReportType, RoadWatchError};

#[derive(sqlx::FromRow)]
struct LinkRow {
    link_id: String,
    user_id: String,
    report_type: String,
    created_at: DateTime<Utc>,
    used: bool,
    used_at: Option<DateTime<Utc>>,
}

impl TryFrom<LinkRow> for CaptureLink {
    type Error = anyhow::Error;

    fn try_from(row: LinkRow) -> Result<Self> {
        let report_type = ReportType::from_slug(&row.report_type)
            .ok_or_else(|| {
                RoadWatchError::InvalidRow(format!("unknown report type '{}'", row.report_type))
            })?;
        Ok(CaptureLink {
            link_id: row.link_id,
            user_id: row.user_id,
            report_type,
            created_at: row.created_at,
            used: row.used,
            used_at: row.used_at,
        })
    }
}

#[derive(Clone)]
pub struct PgCaptureLinkStore {
    pool: PgPool,
}

impl PgCaptureLinkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CaptureLinkStore for PgCaptureLinkStore {
    async fn insert(&self, link: &CaptureLink) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO capture_links (link_id, user_id, report_type, created_at, used, used_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&link.link_id)
        .bind(&link.user_id)
        .bind(link.report_type.slug())
        .bind(link.created_at)
        .bind(link.used)
        .bind(link.used_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, link_id: &str) -> Result<Option<CaptureLink>> {
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            SELECT link_id, user_id, report_type, created_at, used, used_at
            FROM capture_links
            WHERE link_id = $1
            "#,
        )
        .bind(link_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CaptureLink::try_from).transpose()
    }

    async fn mark_used(&self, link_id: &str, at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE capture_links SET used = TRUE, used_at = $2 WHERE link_id = $1 AND used = FALSE",
        )
        .bind(link_id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn reopen(&self, link_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE capture_links SET used = FALSE, used_at = NULL WHERE link_id = $1 AND used = TRUE",
        )
        .bind(link_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
