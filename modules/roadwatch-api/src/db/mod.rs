//! Postgres-backed stores.

mod divisions;
mod links;
mod reports;
mod sessions;

pub use divisions::PgDivisionSource;
pub use links::PgCaptureLinkStore;
pub use reports::PgReportStore;
pub use sessions::PgSessionStore;

use anyhow::Result;
use sqlx::PgPool;

/// Apply the bundled schema migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
