//! HTTP-level integration tests for the lane session state machine:
//! identity capture, the two-sided selection protocol, assignment,
//! payment, signing, and reset.

mod common;

use axum::http::StatusCode;
use common::{identity, KIOSK_TOKEN, REGISTER_TOKEN};
use sqlx::PgPool;

async fn get_view(pool: &PgPool, lane: &str, token: &str) -> (StatusCode, serde_json::Value) {
    let app = common::build_test_app(pool.clone());
    let response = common::get(app, &format!("/api/v1/lanes/{lane}/session"), token).await;
    let status = response.status();
    (status, common::body_json(response).await)
}

async fn post(
    pool: &PgPool,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let app = common::build_test_app(pool.clone());
    let response = common::post_json(app, uri, token, body).await;
    let status = response.status();
    (status, common::body_json(response).await)
}

async fn post_empty(pool: &PgPool, uri: &str, token: &str) -> (StatusCode, serde_json::Value) {
    let app = common::build_test_app(pool.clone());
    let response = common::post_empty(app, uri, token).await;
    let status = response.status();
    (status, common::body_json(response).await)
}

/// Drive lane-1 from idle to AWAITING_ASSIGNMENT with a locked STANDARD
/// selection.
async fn negotiate_standard(pool: &PgPool, scan: &str) {
    let (status, _) = post(
        pool,
        "/api/v1/lanes/lane-1/session/start",
        KIOSK_TOKEN,
        serde_json::json!({"identity": identity(scan, "Walk In")}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(
        pool,
        "/api/v1/lanes/lane-1/session/confirm",
        REGISTER_TOKEN,
        serde_json::json!({"rental_type": "STANDARD", "confirmed_by": "EMPLOYEE"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = post(
        pool,
        "/api/v1/lanes/lane-1/session/acknowledge",
        KIOSK_TOKEN,
        serde_json::json!({"acknowledged_by": "CUSTOMER"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "AWAITING_ASSIGNMENT");
}

// ---------------------------------------------------------------------------
// Idle projection and identity capture
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn idle_lane_projects_placeholder(pool: PgPool) {
    let (status, json) = get_view(&pool, "lane-1", KIOSK_TOKEN).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "IDLE");
    assert!(json["data"]["session_id"].is_null());
    assert_eq!(json["data"]["lane"], "lane-1");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn start_opens_active_session(pool: PgPool) {
    let (status, json) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/start",
        KIOSK_TOKEN,
        serde_json::json!({"identity": identity("scan-alice", "Alice Demo")}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &json["data"];
    assert_eq!(data["status"], "ACTIVE");
    assert_eq!(data["mode"], "CHECKIN");
    assert_eq!(data["customer_name"], "Alice Demo");
    assert_eq!(data["is_member"], false);
    assert!(data["session_id"].is_number());

    // Gym lockers are a member benefit; a non-member must not see them.
    let allowed: Vec<String> = data["allowed_rentals"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    assert!(allowed.contains(&"STANDARD".to_string()));
    assert!(!allowed.contains(&"GYM_LOCKER".to_string()));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn member_sees_gym_lockers(pool: PgPool) {
    common::seed_customer(&pool, "scan-member", "Member Max", true, false, None).await;

    let (status, json) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/start",
        KIOSK_TOKEN,
        serde_json::json!({"identity": identity("scan-member", "Member Max")}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["is_member"], true);
    let allowed = json["data"]["allowed_rentals"].as_array().unwrap();
    assert!(allowed.iter().any(|v| v == "GYM_LOCKER"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn banned_customer_is_rejected_at_start(pool: PgPool) {
    common::seed_customer(&pool, "scan-ban", "Banned Bob", false, true, Some("house ban")).await;

    let (status, json) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/start",
        KIOSK_TOKEN,
        serde_json::json!({"identity": identity("scan-ban", "Banned Bob")}),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "BANNED");
    assert_eq!(json["error"], "house ban");

    // No session was opened.
    let (_, json) = get_view(&pool, "lane-1", KIOSK_TOKEN).await;
    assert_eq!(json["data"]["status"], "IDLE");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn underage_customer_is_rejected(pool: PgPool) {
    let (status, json) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/start",
        KIOSK_TOKEN,
        serde_json::json!({"identity": {
            "scan_hash": "scan-minor",
            "name": "Too Young",
            "date_of_birth": "2015-06-01",
        }}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn new_scan_replaces_live_session(pool: PgPool) {
    let (status, _) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/start",
        KIOSK_TOKEN,
        serde_json::json!({"identity": identity("scan-one", "First")}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/start",
        KIOSK_TOKEN,
        serde_json::json!({"identity": identity("scan-two", "Second")}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["customer_name"], "Second");

    // Exactly one live session remains on the lane.
    let live: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM lane_sessions \
         WHERE lane_id = 'lane-1' AND status NOT IN ('COMPLETED', 'CANCELLED')",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(live, 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn renewal_requires_an_open_visit(pool: PgPool) {
    let (status, json) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/start",
        KIOSK_TOKEN,
        serde_json::json!({
            "identity": identity("scan-renew", "No Visit"),
            "mode": "RENEWAL",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Full walk-in happy path
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn full_checkin_happy_path(pool: PgPool) {
    let room = common::seed_clean_room(&pool, 101, "STANDARD").await;

    let (status, _) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/start",
        KIOSK_TOKEN,
        serde_json::json!({"identity": identity("scan-happy", "Happy Path")}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Customer proposes on the kiosk.
    let (status, json) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/propose",
        KIOSK_TOKEN,
        serde_json::json!({"rental_type": "STANDARD", "proposed_by": "CUSTOMER"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["proposed_rental_type"], "STANDARD");
    assert_eq!(json["data"]["selection_locked"], false);

    // Staff confirms: the selection locks.
    let (status, json) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/confirm",
        REGISTER_TOKEN,
        serde_json::json!({"rental_type": "STANDARD", "confirmed_by": "EMPLOYEE"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["selection_locked"], true);
    assert_eq!(json["data"]["desired_rental_type"], "STANDARD");

    // The other side acknowledges; the session moves to assignment.
    let (status, json) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/acknowledge",
        KIOSK_TOKEN,
        serde_json::json!({"acknowledged_by": "CUSTOMER"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "AWAITING_ASSIGNMENT");
    assert_eq!(json["data"]["selection_acknowledged"], true);

    // Auto-assign picks the clean room.
    let (status, json) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/assign",
        REGISTER_TOKEN,
        serde_json::json!({"rental_type": "STANDARD"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "AWAITING_PAYMENT");
    assert_eq!(json["data"]["assigned_resource_id"], room);

    // Nothing is consumed before finalize.
    assert_eq!(common::resource_status(&pool, room).await, "CLEAN");

    let (status, json) = post_empty(
        &pool,
        "/api/v1/lanes/lane-1/session/payment-intent",
        REGISTER_TOKEN,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let intent = json["data"]["payment_intent_id"].as_str().unwrap();
    assert!(intent.starts_with("pi_"), "got intent {intent}");
    assert!(json["data"]["price_quote"].is_object());

    let (status, json) = post_empty(
        &pool,
        "/api/v1/lanes/lane-1/session/mark-paid",
        REGISTER_TOKEN,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "AWAITING_SIGNATURE");
    assert_eq!(json["data"]["payment_status"], "PAID");

    let (status, json) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/sign-agreement",
        KIOSK_TOKEN,
        serde_json::json!({"disclaimer_ack": {"signed": true, "points": [[1, 2], [3, 4]]}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "COMPLETED");
    assert_eq!(json["data"]["agreement_signed"], true);

    // Inventory and records landed atomically.
    assert_eq!(common::resource_status(&pool, room).await, "OCCUPIED");
    let blocks: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM checkin_blocks WHERE kind = 'INITIAL'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(blocks, 1);
    let open_visits: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM visits WHERE ended_at IS NULL")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(open_visits, 1);

    // A duplicate signature submission is an idempotent replay.
    let (status, json) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/sign-agreement",
        KIOSK_TOKEN,
        serde_json::json!({"disclaimer_ack": {"signed": true}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "COMPLETED");
    let blocks_after: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM checkin_blocks")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(blocks_after, 1, "replay must not create another block");
}

// ---------------------------------------------------------------------------
// Selection protocol edges
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn first_confirm_wins_second_gets_already_locked(pool: PgPool) {
    post(
        &pool,
        "/api/v1/lanes/lane-1/session/start",
        KIOSK_TOKEN,
        serde_json::json!({"identity": identity("scan-race", "Racer")}),
    )
    .await;

    // Customer confirms LOCKER first.
    let (status, _) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/confirm",
        KIOSK_TOKEN,
        serde_json::json!({"rental_type": "LOCKER", "confirmed_by": "CUSTOMER"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Staff's racing confirm for a different tier loses.
    let (status, json) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/confirm",
        REGISTER_TOKEN,
        serde_json::json!({"rental_type": "STANDARD", "confirmed_by": "EMPLOYEE"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "ALREADY_LOCKED");

    // The first writer's tier stands.
    let (_, json) = get_view(&pool, "lane-1", REGISTER_TOKEN).await;
    assert_eq!(json["data"]["desired_rental_type"], "LOCKER");
    let confirmed_by: String = sqlx::query_scalar(
        "SELECT confirmed_by FROM lane_sessions WHERE lane_id = 'lane-1' \
         AND status NOT IN ('COMPLETED', 'CANCELLED')",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(confirmed_by, "CUSTOMER");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn propose_after_lock_is_rejected(pool: PgPool) {
    post(
        &pool,
        "/api/v1/lanes/lane-1/session/start",
        KIOSK_TOKEN,
        serde_json::json!({"identity": identity("scan-late", "Late Proposer")}),
    )
    .await;
    post(
        &pool,
        "/api/v1/lanes/lane-1/session/confirm",
        REGISTER_TOKEN,
        serde_json::json!({"rental_type": "STANDARD", "confirmed_by": "EMPLOYEE"}),
    )
    .await;

    let (status, json) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/propose",
        KIOSK_TOKEN,
        serde_json::json!({"rental_type": "DOUBLE", "proposed_by": "CUSTOMER"}),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "ALREADY_LOCKED");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn confirmer_cannot_acknowledge_its_own_selection(pool: PgPool) {
    post(
        &pool,
        "/api/v1/lanes/lane-1/session/start",
        KIOSK_TOKEN,
        serde_json::json!({"identity": identity("scan-ack", "Ack Test")}),
    )
    .await;
    post(
        &pool,
        "/api/v1/lanes/lane-1/session/confirm",
        REGISTER_TOKEN,
        serde_json::json!({"rental_type": "STANDARD", "confirmed_by": "EMPLOYEE"}),
    )
    .await;

    let (status, json) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/acknowledge",
        REGISTER_TOKEN,
        serde_json::json!({"acknowledged_by": "EMPLOYEE"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    // The other side may.
    let (status, _) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/acknowledge",
        KIOSK_TOKEN,
        serde_json::json!({"acknowledged_by": "CUSTOMER"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn commands_outside_their_state_are_invalid(pool: PgPool) {
    post(
        &pool,
        "/api/v1/lanes/lane-1/session/start",
        KIOSK_TOKEN,
        serde_json::json!({"identity": identity("scan-order", "Out Of Order")}),
    )
    .await;

    // Assign while still negotiating.
    let (status, json) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/assign",
        REGISTER_TOKEN,
        serde_json::json!({"rental_type": "STANDARD"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "INVALID_STATE");

    // Sign while still negotiating.
    let (status, json) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/sign-agreement",
        KIOSK_TOKEN,
        serde_json::json!({"disclaimer_ack": {}}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "INVALID_STATE");

    // Commands against a lane with no session at all.
    let (status, json) = post(
        &pool,
        "/api/v1/lanes/lane-2/session/confirm",
        REGISTER_TOKEN,
        serde_json::json!({"rental_type": "STANDARD", "confirmed_by": "EMPLOYEE"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "INVALID_STATE");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn mark_paid_requires_a_payment_intent(pool: PgPool) {
    common::seed_clean_room(&pool, 101, "STANDARD").await;
    negotiate_standard(&pool, "scan-nopay").await;
    post(
        &pool,
        "/api/v1/lanes/lane-1/session/assign",
        REGISTER_TOKEN,
        serde_json::json!({"rental_type": "STANDARD"}),
    )
    .await;

    let (status, json) = post_empty(
        &pool,
        "/api/v1/lanes/lane-1/session/mark-paid",
        REGISTER_TOKEN,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Cross-type assignment
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn cross_type_assignment_detours_through_the_customer(pool: PgPool) {
    // Only a DOUBLE is clean; the customer wanted STANDARD.
    let double = common::seed_clean_room(&pool, 201, "DOUBLE").await;
    negotiate_standard(&pool, "scan-cross").await;

    let (status, json) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/assign",
        REGISTER_TOKEN,
        serde_json::json!({"rental_type": "DOUBLE"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "AWAITING_CUSTOMER");
    assert_eq!(json["data"]["assigned_resource_id"], double);

    // Decline reverts the tentative assignment.
    let (status, json) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/customer-response",
        KIOSK_TOKEN,
        serde_json::json!({"accepted": false}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "AWAITING_ASSIGNMENT");
    assert!(json["data"]["assigned_resource_id"].is_null());

    // Second try, this time the customer accepts.
    post(
        &pool,
        "/api/v1/lanes/lane-1/session/assign",
        REGISTER_TOKEN,
        serde_json::json!({"rental_type": "DOUBLE"}),
    )
    .await;
    let (status, json) = post(
        &pool,
        "/api/v1/lanes/lane-1/session/customer-response",
        KIOSK_TOKEN,
        serde_json::json!({"accepted": true}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "AWAITING_PAYMENT");
    assert_eq!(json["data"]["assigned_rental_type"], "DOUBLE");
}

// ---------------------------------------------------------------------------
// Reset
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn reset_cancels_the_session_and_is_idempotent(pool: PgPool) {
    common::seed_clean_room(&pool, 101, "STANDARD").await;
    negotiate_standard(&pool, "scan-reset").await;
    post(
        &pool,
        "/api/v1/lanes/lane-1/session/assign",
        REGISTER_TOKEN,
        serde_json::json!({"rental_type": "STANDARD"}),
    )
    .await;

    let (status, json) = post_empty(
        &pool,
        "/api/v1/lanes/lane-1/session/reset",
        REGISTER_TOKEN,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "IDLE");

    // The tentative assignment evaporated with the session.
    let (_, json) = get_view(&pool, "lane-1", KIOSK_TOKEN).await;
    assert_eq!(json["data"]["status"], "IDLE");
    let clean: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resources WHERE status = 'CLEAN'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(clean, 1);

    // Resetting an idle lane just re-broadcasts the idle view.
    let (status, json) = post_empty(
        &pool,
        "/api/v1/lanes/lane-1/session/reset",
        REGISTER_TOKEN,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "IDLE");
}
