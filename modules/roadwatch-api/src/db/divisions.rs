use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use roadwatch_common::{Division, Officer};
use roadwatch_geo::{parse_ring, DivisionSource};

#[derive(sqlx::FromRow)]
struct DivisionRow {
    id: Uuid,
    name: String,
    code: String,
    email: Option<String>,
    boundary: Value,
    officers: Value,
}

impl From<DivisionRow> for Division {
    fn from(row: DivisionRow) -> Self {
        let boundary = parse_ring(&row.boundary);
        if boundary.is_empty() {
            warn!(division = row.name.as_str(), "Division has no usable boundary");
        }
        let officers = parse_officers(row.id, &row.name, row.officers);
        Division {
            id: row.id,
            name: row.name,
            code: row.code,
            email: row.email.filter(|e| !e.trim().is_empty()),
            boundary,
            officers,
        }
    }
}

/// Roster entries that fail to decode are skipped, not fatal. Entries without
/// an id get one derived from the division and phone, stable across loads.
fn parse_officers(division_id: Uuid, division: &str, value: Value) -> Vec<Officer> {
    let Value::Array(entries) = value else {
        warn!(division, "Officer roster is not a list");
        return Vec::new();
    };
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<Officer>(entry) {
            Ok(mut officer) => {
                if officer.id.is_nil() {
                    officer.id = Uuid::new_v5(&division_id, officer.phone.trim().as_bytes());
                }
                Some(officer)
            }
            Err(e) => {
                warn!(division, error = %e, "Skipping malformed officer entry");
                None
            }
        })
        .collect()
}

/// Divisions in `divisions`, listed in configured order.
#[derive(Clone)]
pub struct PgDivisionSource {
    pool: PgPool,
}

impl PgDivisionSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DivisionSource for PgDivisionSource {
    async fn list_divisions(&self) -> Result<Vec<Division>> {
        let rows = sqlx::query_as::<_, DivisionRow>(
            r#"
            SELECT id, name, code, email, boundary, officers
            FROM divisions
            ORDER BY position ASC, created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Division::from).collect())
    }

    async fn division_by_id(&self, id: Uuid) -> Result<Option<Division>> {
        let row = sqlx::query_as::<_, DivisionRow>(
            "SELECT id, name, code, email, boundary, officers FROM divisions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Division::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn malformed_officers_are_skipped() {
        let officers = parse_officers(
            Uuid::new_v4(),
            "Nigdi",
            json!([
                {
                    "id": "6f1c2a9e-0b7c-4a53-9d54-2f1d3f7e9a10",
                    "name": "PI Kale",
                    "phone": "+919800000001",
                    "alternate_phone": null,
                    "is_active": true
                },
                {"name": "missing fields"}
            ]),
        );
        assert_eq!(officers.len(), 1);
        assert_eq!(officers[0].name, "PI Kale");
    }

    #[test]
    fn non_list_roster_is_empty() {
        assert!(parse_officers(Uuid::new_v4(), "Nigdi", json!({"officers": []})).is_empty());
    }

    #[test]
    fn camel_case_roster_without_ids_is_accepted() {
        let division_id = Uuid::new_v4();
        let roster = json!([
            {"name": "PI Kale", "phone": "+919800000001", "alternatePhone": "+919800000011", "isActive": true},
            {"name": "PSI More", "phone": "+919800000002", "alternatePhone": null, "isActive": false},
            {"name": "ASI Jadhav", "phone": "+919800000003"}
        ]);

        let officers = parse_officers(division_id, "Nigdi", roster.clone());
        assert_eq!(officers.len(), 3);
        assert_eq!(officers[0].alternate_phone.as_deref(), Some("+919800000011"));
        assert!(officers[0].is_active);
        assert!(!officers[1].is_active);
        assert!(officers[2].is_active);
        assert!(officers.iter().all(|o| !o.id.is_nil()));
        assert_ne!(officers[0].id, officers[1].id);

        let reloaded = parse_officers(division_id, "Nigdi", roster);
        assert_eq!(officers[0].id, reloaded[0].id);
    }
}
