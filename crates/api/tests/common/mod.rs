//! Shared helpers for HTTP-level integration tests.
//!
//! Requests are sent straight into the router via `tower::ServiceExt`,
//! no TCP listener involved. Every request must carry a device token;
//! the helpers below take the token explicitly so tests can exercise
//! kiosk vs register vs disabled behaviour.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use frontdesk_api::config::{DeviceEntry, DeviceKind, ServerConfig};
use frontdesk_api::middleware::device::DEVICE_TOKEN_HEADER;
use frontdesk_api::router::build_app_router;
use frontdesk_api::state::AppState;
use frontdesk_api::ws::WsManager;
use frontdesk_core::pricing::FlatRatePricing;
use frontdesk_events::EventBus;

/// Kiosk bound to `lane-1`.
pub const KIOSK_TOKEN: &str = "test-kiosk";
/// Kiosk bound to `lane-2`.
pub const KIOSK_2_TOKEN: &str = "test-kiosk-2";
/// Register bound to `lane-1` (staff devices may drive any lane).
pub const REGISTER_TOKEN: &str = "test-register";
/// A provisioned but disabled register.
pub const DISABLED_TOKEN: &str = "test-disabled";

/// Build a test `ServerConfig` with a small fixed device registry.
pub fn test_config() -> ServerConfig {
    let mut devices = HashMap::new();
    devices.insert(
        KIOSK_TOKEN.to_string(),
        DeviceEntry {
            kind: DeviceKind::Kiosk,
            lane: "lane-1".to_string(),
            disabled: false,
        },
    );
    devices.insert(
        KIOSK_2_TOKEN.to_string(),
        DeviceEntry {
            kind: DeviceKind::Kiosk,
            lane: "lane-2".to_string(),
            disabled: false,
        },
    );
    devices.insert(
        REGISTER_TOKEN.to_string(),
        DeviceEntry {
            kind: DeviceKind::Register,
            lane: "lane-1".to_string(),
            disabled: false,
        },
    );
    devices.insert(
        DISABLED_TOKEN.to_string(),
        DeviceEntry {
            kind: DeviceKind::Register,
            lane: "lane-1".to_string(),
            disabled: true,
        },
    );

    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        offer_window_secs: 900,
        hold_tick_secs: 5,
        waitlist_sweep_secs: 60,
        block_hours: 12,
        devices,
    }
}

/// Build an `AppState` over the given pool with test defaults.
pub fn test_state(pool: PgPool) -> AppState {
    AppState {
        pool,
        config: Arc::new(test_config()),
        ws_manager: Arc::new(WsManager::new()),
        event_bus: Arc::new(EventBus::default()),
        quoter: Arc::new(FlatRatePricing),
    }
}

/// Build the full application router with all middleware layers, using
/// the given database pool.
///
/// Mirrors the production construction so tests exercise the same
/// middleware stack (CORS, request ID, timeout, tracing, panic recovery).
pub fn build_test_app(pool: PgPool) -> Router {
    let state = test_state(pool);
    let config = Arc::clone(&state.config);
    build_app_router(state, &config)
}

/// Send a request with a device token and optional JSON body.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(DEVICE_TOKEN_HEADER, token);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(
    app: Router,
    uri: &str,
    token: &str,
    json: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(json)).await
}

pub async fn post_empty(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

/// Collect a response body into JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        panic!(
            "response body was not JSON ({e}): {}",
            String::from_utf8_lossy(&bytes)
        )
    })
}

/// A scanned-identity request body for an adult customer.
pub fn identity(scan_hash: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "scan_hash": scan_hash,
        "name": name,
        "date_of_birth": "1990-04-12",
    })
}

// ---------------------------------------------------------------------------
// Database seeding
// ---------------------------------------------------------------------------

/// Insert a resource and return its id.
pub async fn seed_resource(pool: &PgPool, kind: &str, number: i32, tier: &str, status: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO resources (kind, number, rental_type, status) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(kind)
    .bind(number)
    .bind(tier)
    .bind(status)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Insert a clean room of the given tier.
pub async fn seed_clean_room(pool: &PgPool, number: i32, tier: &str) -> i64 {
    seed_resource(pool, "ROOM", number, tier, "CLEAN").await
}

/// Insert a customer directly (for ban / membership fixtures).
pub async fn seed_customer(
    pool: &PgPool,
    scan_hash: &str,
    name: &str,
    is_member: bool,
    is_banned: bool,
    ban_reason: Option<&str>,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO customers (name, date_of_birth, scan_hash, is_member, is_banned, ban_reason) \
         VALUES ($1, '1990-04-12', $2, $3, $4, $5) RETURNING id",
    )
    .bind(name)
    .bind(scan_hash)
    .bind(is_member)
    .bind(is_banned)
    .bind(ban_reason)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Insert an open visit for the customer.
pub async fn seed_open_visit(pool: &PgPool, customer_id: i64) -> i64 {
    sqlx::query_scalar("INSERT INTO visits (customer_id) VALUES ($1) RETURNING id")
        .bind(customer_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Insert a check-in block on the visit ending `hours_from_now` hours
/// from now (negative for already-ended blocks).
pub async fn seed_block(pool: &PgPool, visit_id: i64, tier: &str, hours_from_now: i64) -> i64 {
    let ends_at = Utc::now() + Duration::hours(hours_from_now);
    sqlx::query_scalar(
        "INSERT INTO checkin_blocks (visit_id, kind, rental_type, ends_at) \
         VALUES ($1, 'INITIAL', $2, $3) RETURNING id",
    )
    .bind(visit_id)
    .bind(tier)
    .bind(ends_at)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Insert an ACTIVE waitlist entry.
pub async fn seed_active_entry(
    pool: &PgPool,
    visit_id: i64,
    block_id: i64,
    desired_tier: &str,
    backup_tier: Option<&str>,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO waitlist_entries (visit_id, checkin_block_id, desired_tier, backup_tier) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(visit_id)
    .bind(block_id)
    .bind(desired_tier)
    .bind(backup_tier)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Flip an entry to OFFERED holding `resource_id`, with an open
/// reservation, expiring `secs_from_now` seconds from now.
pub async fn offer_entry(pool: &PgPool, entry_id: i64, resource_id: i64, secs_from_now: i64) {
    let expires_at = Utc::now() + Duration::seconds(secs_from_now);
    sqlx::query(
        "UPDATE waitlist_entries \
         SET status = 'OFFERED', resource_id = $2, offered_at = NOW(), offer_expires_at = $3 \
         WHERE id = $1",
    )
    .bind(entry_id)
    .bind(resource_id)
    .bind(expires_at)
    .execute(pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO inventory_reservations (resource_id, waitlist_id, expires_at) \
         VALUES ($1, $2, $3)",
    )
    .bind(resource_id)
    .bind(entry_id)
    .bind(expires_at)
    .execute(pool)
    .await
    .unwrap();
}

// ---------------------------------------------------------------------------
// Database assertions
// ---------------------------------------------------------------------------

pub async fn resource_status(pool: &PgPool, id: i64) -> String {
    sqlx::query_scalar("SELECT status FROM resources WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn entry_status(pool: &PgPool, id: i64) -> String {
    sqlx::query_scalar("SELECT status FROM waitlist_entries WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn open_reservation_count(pool: &PgPool, resource_id: i64) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM inventory_reservations \
         WHERE resource_id = $1 AND released_at IS NULL",
    )
    .bind(resource_id)
    .fetch_one(pool)
    .await
    .unwrap()
}
