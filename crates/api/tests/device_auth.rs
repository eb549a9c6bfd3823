//! Device gate tests: every API route sits behind the provisioned-device
//! token check, and kiosks are pinned to their lane.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, get, send};
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_token_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = send(app, Method::GET, "/api/v1/lanes/lane-1/session", None, None).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "DEVICE_DISABLED");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_token_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app, "/api/v1/lanes/lane-1/session", "not-a-device").await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "DEVICE_DISABLED");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn disabled_token_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app, "/api/v1/lanes/lane-1/session", common::DISABLED_TOKEN).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "DEVICE_DISABLED");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn kiosk_cannot_address_a_foreign_lane(pool: PgPool) {
    let app = common::build_test_app(pool.clone());

    // lane-2's kiosk asking about lane-1.
    let response = get(app, "/api/v1/lanes/lane-1/session", common::KIOSK_2_TOKEN).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "DEVICE_DISABLED");

    // On its own lane it is fine.
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/lanes/lane-2/session", common::KIOSK_2_TOKEN).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_may_drive_any_lane(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let response = get(app, "/api/v1/lanes/lane-1/session", common::REGISTER_TOKEN).await;
    assert_eq!(response.status(), StatusCode::OK);

    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/lanes/lane-2/session", common::REGISTER_TOKEN).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn kiosk_cannot_use_the_waitlist_surface(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app, "/api/v1/waitlist", common::KIOSK_TOKEN).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "DEVICE_DISABLED");
}
