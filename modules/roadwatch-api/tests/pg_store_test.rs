//! Integration tests for the Postgres stores.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use chrono::{Duration, Utc};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use roadwatch_api::db::{self, PgCaptureLinkStore, PgDivisionSource, PgReportStore, PgSessionStore};
use roadwatch_api::ReportStore;
use roadwatch_chat::{
    CaptureLink, CaptureLinkStore, ConversationState, SaveOutcome, Session, SessionStore,
};
use roadwatch_common::{
    DeliveryStatus, GeoLocation, OfficerNotification, Report, ReportStatus, ReportType,
};
use roadwatch_geo::DivisionSource;

/// Get a migrated test database pool, or skip if no test DB is available.
async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    db::migrate(&pool).await.ok()?;
    Some(pool)
}

/// Tests share one database and run in parallel, so rows are keyed per test.
fn user() -> String {
    format!("91{}", Uuid::new_v4().as_u128() % 10_000_000_000)
}

// =========================================================================
// Sessions
// =========================================================================

#[tokio::test]
async fn session_compare_and_swap() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PgSessionStore::new(pool);
    let user = user();

    let fresh = Session::new(user.clone(), Utc::now());
    assert_eq!(store.save(&fresh).await.unwrap(), SaveOutcome::Saved(1));
    assert_eq!(store.save(&fresh).await.unwrap(), SaveOutcome::Conflict);

    let mut loaded = store.load(&user).await.unwrap().unwrap();
    assert_eq!(loaded.version, 1);
    loaded.state = ConversationState::Menu;
    loaded.last_option = Some(ReportType::SignalMalfunction);
    let stale = loaded.clone();

    assert_eq!(store.save(&loaded).await.unwrap(), SaveOutcome::Saved(2));
    assert_eq!(store.save(&stale).await.unwrap(), SaveOutcome::Conflict);

    let stored = store.load(&user).await.unwrap().unwrap();
    assert_eq!(stored.state, ConversationState::Menu);
    assert_eq!(stored.last_option, Some(ReportType::SignalMalfunction));
    assert_eq!(stored.version, 2);
}

// =========================================================================
// Capture links
// =========================================================================

#[tokio::test]
async fn link_mark_used_is_single_shot_and_reopenable() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PgCaptureLinkStore::new(pool);
    let link = CaptureLink {
        link_id: Uuid::new_v4().simple().to_string(),
        user_id: user(),
        report_type: ReportType::Accident,
        created_at: Utc::now(),
        used: false,
        used_at: None,
    };
    store.insert(&link).await.unwrap();

    assert!(store.mark_used(&link.link_id, Utc::now()).await.unwrap());
    assert!(!store.mark_used(&link.link_id, Utc::now()).await.unwrap());

    let stored = store.get(&link.link_id).await.unwrap().unwrap();
    assert!(stored.used);
    assert!(stored.used_at.is_some());
    assert!(store.get("missing").await.unwrap().is_none());

    assert!(store.reopen(&link.link_id).await.unwrap());
    assert!(!store.reopen(&link.link_id).await.unwrap());
    let reopened = store.get(&link.link_id).await.unwrap().unwrap();
    assert!(!reopened.used);
    assert!(reopened.used_at.is_none());
}

// =========================================================================
// Divisions and reports
// =========================================================================

#[tokio::test]
async fn divisions_load_with_lenient_boundaries() {
    let Some(pool) = test_pool().await else {
        return;
    };

    sqlx::query("DELETE FROM divisions")
        .execute(&pool)
        .await
        .unwrap();

    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO divisions (id, name, code, email, boundary, officers, position) VALUES ($1, $2, $3, $4, $5, $6, 0)",
    )
    .bind(id)
    .bind("Nigdi")
    .bind("NIGDI")
    .bind("nigdi@example.test")
    .bind(json!({
        "type": "Polygon",
        "coordinates": [[["73.75", "18.57"], [73.85, 18.57], [73.85, 18.67], [73.75, 18.67]]]
    }))
    .bind(json!([
        {
            "id": Uuid::new_v4(),
            "name": "PI Kale",
            "phone": "+919800000001",
            "alternate_phone": null,
            "is_active": true
        },
        {"broken": true}
    ]))
    .execute(&pool)
    .await
    .unwrap();

    let source = PgDivisionSource::new(pool);
    let divisions = source.list_divisions().await.unwrap();
    assert_eq!(divisions.len(), 1);
    assert_eq!(divisions[0].boundary.len(), 4);
    assert_eq!(divisions[0].officers.len(), 1);

    let by_id = source.division_by_id(id).await.unwrap().unwrap();
    assert_eq!(by_id.name, "Nigdi");
}

#[tokio::test]
async fn report_insert_round_trips_notifications() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PgReportStore::new(pool.clone());

    let report = Report {
        id: Uuid::new_v4(),
        user_id: user(),
        user_name: Some("Asha".to_string()),
        report_type: ReportType::RoadDamage,
        description: "Pothole".to_string(),
        photo_url: None,
        location: Some(GeoLocation {
            lat: 18.62,
            lng: 73.80,
            address: None,
        }),
        status: ReportStatus::Pending,
        division_id: None,
        division_name: Some("Nigdi".to_string()),
        division_notified: true,
        officers_notified: vec![OfficerNotification {
            officer_id: Uuid::new_v4(),
            phone: "+919800000001".to_string(),
            sent_at: Utc::now() - Duration::seconds(1),
            delivery_status: DeliveryStatus::Sent,
            provider_message_id: Some("SM1".to_string()),
        }],
        join_details: None,
        created_at: Utc::now(),
    };
    store.insert(&report).await.unwrap();

    let (status, notifications): (String, serde_json::Value) =
        sqlx::query_as("SELECT status, officers_notified FROM reports WHERE id = $1")
            .bind(report.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, "pending");
    assert_eq!(notifications[0]["delivery_status"], "sent");
    assert_eq!(notifications[0]["provider_message_id"], "SM1");
}
