//! Staff waitlist surface and the stale-demand backstop sweep.

mod common;

use axum::http::{Method, StatusCode};
use common::REGISTER_TOKEN;
use sqlx::PgPool;

use frontdesk_api::background::waitlist_expiry;
use frontdesk_events::{CheckinEvent, EventBus};

/// Queue an ACTIVE entry whose block ends `hours_from_now` hours from
/// now. Returns (visit, entry).
async fn seed_entry(pool: &PgPool, scan: &str, desired: &str, hours_from_now: i64) -> (i64, i64) {
    let customer = common::seed_customer(pool, scan, "Queued Guest", false, false, None).await;
    let visit = common::seed_open_visit(pool, customer).await;
    let block = common::seed_block(pool, visit, "STANDARD", hours_from_now).await;
    let entry = common::seed_active_entry(pool, visit, block, desired, None).await;
    (visit, entry)
}

// ---------------------------------------------------------------------------
// Stale-demand sweep
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn sweep_expires_demand_whose_block_ended(pool: PgPool) {
    let (_, stale) = seed_entry(&pool, "scan-stale", "DOUBLE", -1).await;
    let (_, fresh) = seed_entry(&pool, "scan-fresh", "DOUBLE", 8).await;

    let bus = EventBus::default();
    let mut rx = bus.subscribe();
    let expired = waitlist_expiry::sweep(&pool, &bus).await.unwrap();

    assert_eq!(expired, 1);
    assert_eq!(common::entry_status(&pool, stale).await, "EXPIRED");
    assert_eq!(common::entry_status(&pool, fresh).await, "ACTIVE");

    assert!(matches!(
        rx.recv().await.unwrap(),
        CheckinEvent::WaitlistUpdated { waitlist_id, .. } if waitlist_id == stale
    ));
    // Shielded units became plain availability, so inventory is re-announced.
    assert!(matches!(
        rx.recv().await.unwrap(),
        CheckinEvent::InventoryUpdated { .. }
    ));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn sweep_expires_demand_whose_visit_ended(pool: PgPool) {
    let (visit, entry) = seed_entry(&pool, "scan-gone", "DOUBLE", 8).await;
    sqlx::query("UPDATE visits SET ended_at = NOW() WHERE id = $1")
        .bind(visit)
        .execute(&pool)
        .await
        .unwrap();

    let bus = EventBus::default();
    let expired = waitlist_expiry::sweep(&pool, &bus).await.unwrap();

    assert_eq!(expired, 1);
    assert_eq!(common::entry_status(&pool, entry).await, "EXPIRED");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn sweep_releases_the_hold_of_a_stale_offer(pool: PgPool) {
    let (_, entry) = seed_entry(&pool, "scan-held", "DOUBLE", -1).await;
    let double = common::seed_clean_room(&pool, 201, "DOUBLE").await;
    common::offer_entry(&pool, entry, double, 900).await;

    let bus = EventBus::default();
    let expired = waitlist_expiry::sweep(&pool, &bus).await.unwrap();

    assert_eq!(expired, 1);
    assert_eq!(common::entry_status(&pool, entry).await, "EXPIRED");
    assert_eq!(common::open_reservation_count(&pool, double).await, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn sweep_with_nothing_stale_is_a_noop(pool: PgPool) {
    let (_, fresh) = seed_entry(&pool, "scan-fresh", "DOUBLE", 8).await;

    let bus = EventBus::default();
    let expired = waitlist_expiry::sweep(&pool, &bus).await.unwrap();

    assert_eq!(expired, 0);
    assert_eq!(common::entry_status(&pool, fresh).await, "ACTIVE");
}

// ---------------------------------------------------------------------------
// Staff surface
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn list_open_returns_entries_oldest_first(pool: PgPool) {
    let (_, first) = seed_entry(&pool, "scan-a", "DOUBLE", 8).await;
    let (_, second) = seed_entry(&pool, "scan-b", "SPECIAL", 8).await;

    // Closed entries are filtered out.
    let (_, closed) = seed_entry(&pool, "scan-c", "DOUBLE", 8).await;
    sqlx::query("UPDATE waitlist_entries SET status = 'CANCELLED' WHERE id = $1")
        .bind(closed)
        .execute(&pool)
        .await
        .unwrap();

    let app = common::build_test_app(pool.clone());
    let response = common::get(app, "/api/v1/waitlist", REGISTER_TOKEN).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = common::body_json(response).await;

    let ids: Vec<i64> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![first, second]);
    assert_eq!(json["data"][0]["desired_tier"], "DOUBLE");
    assert_eq!(json["data"][0]["status"], "ACTIVE");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn staff_cancel_closes_the_entry_and_releases_its_hold(pool: PgPool) {
    let (_, entry) = seed_entry(&pool, "scan-cancel", "DOUBLE", 8).await;
    let double = common::seed_clean_room(&pool, 201, "DOUBLE").await;
    common::offer_entry(&pool, entry, double, 900).await;

    let app = common::build_test_app(pool.clone());
    let response = common::send(
        app,
        Method::POST,
        &format!("/api/v1/waitlist/{entry}/cancel"),
        Some(REGISTER_TOKEN),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = common::body_json(response).await;
    assert_eq!(json["data"]["status"], "CANCELLED");

    assert_eq!(common::entry_status(&pool, entry).await, "CANCELLED");
    assert_eq!(common::open_reservation_count(&pool, double).await, 0);
    let reason: Option<String> = sqlx::query_scalar(
        "SELECT release_reason FROM inventory_reservations WHERE waitlist_id = $1",
    )
    .bind(entry)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(reason.as_deref(), Some("CANCELLED"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn cancelling_a_closed_entry_conflicts(pool: PgPool) {
    let (_, entry) = seed_entry(&pool, "scan-closed", "DOUBLE", 8).await;
    sqlx::query("UPDATE waitlist_entries SET status = 'COMPLETED' WHERE id = $1")
        .bind(entry)
        .execute(&pool)
        .await
        .unwrap();

    let app = common::build_test_app(pool.clone());
    let response = common::send(
        app,
        Method::POST,
        &format!("/api/v1/waitlist/{entry}/cancel"),
        Some(REGISTER_TOKEN),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = common::body_json(response).await;
    assert_eq!(json["code"], "INVALID_STATE");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn cancelling_an_unknown_entry_is_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = common::send(
        app,
        Method::POST,
        "/api/v1/waitlist/999999/cancel",
        Some(REGISTER_TOKEN),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = common::body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}
