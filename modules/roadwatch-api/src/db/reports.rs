use anyhow::Result;
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use roadwatch_common::Report;

use crate::pipeline::ReportStore;

#[derive(Clone)]
pub struct PgReportStore {
    pool: PgPool,
}

impl PgReportStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn insert(&self, report: &Report) -> Result<()> {
        let location = report.location.as_ref();

        sqlx::query(
            r#"
            INSERT INTO reports (
                id, user_id, user_name, report_type, description, photo_url,
                latitude, longitude, address, status, division_id, division_name,
                division_notified, officers_notified, join_details, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(report.id)
        .bind(&report.user_id)
        .bind(&report.user_name)
        .bind(report.report_type.slug())
        .bind(&report.description)
        .bind(&report.photo_url)
        .bind(location.map(|l| l.lat))
        .bind(location.map(|l| l.lng))
        .bind(location.and_then(|l| l.address.as_deref()))
        .bind(report.status.as_str())
        .bind(report.division_id)
        .bind(&report.division_name)
        .bind(report.division_notified)
        .bind(Json(&report.officers_notified))
        .bind(report.join_details.as_ref().map(Json))
        .bind(report.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
