//! Integration tests for the health endpoint and general HTTP behaviour.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, ScriptedBackend};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn health_check_returns_ok_with_json(pool: PgPool) {
    let app = common::build_test_app(pool, ScriptedBackend::empty());
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["db_healthy"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_route_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool, ScriptedBackend::empty());
    let response = get(app, "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn response_contains_x_request_id_header(pool: PgPool) {
    let app = common::build_test_app(pool, ScriptedBackend::empty());
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let request_id = response.headers().get("x-request-id");
    assert!(
        request_id.is_some(),
        "Response must contain an x-request-id header"
    );

    let id_str = request_id.unwrap().to_str().unwrap();
    assert_eq!(id_str.len(), 36, "x-request-id should be a UUID string");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn project_crud_roundtrip(pool: PgPool) {
    let app = common::build_test_app(pool, ScriptedBackend::empty());

    let created = common::expect_json(
        common::post_json(
            app.clone(),
            "/api/v1/projects",
            serde_json::json!({ "name": "demo" }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let fetched = common::expect_json(
        get(app.clone(), &format!("/api/v1/projects/{id}")).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(fetched["name"], "demo");

    let scenes = common::expect_json(
        get(app, &format!("/api/v1/projects/{id}/scenes")).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(scenes["data"].as_array().unwrap().len(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_project_returns_404_with_code(pool: PgPool) {
    let app = common::build_test_app(pool, ScriptedBackend::empty());

    let body = common::expect_json(
        get(app, "/api/v1/projects/999999").await,
        StatusCode::NOT_FOUND,
    )
    .await;
    assert_eq!(body["code"], "NOT_FOUND");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_project_name_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool, ScriptedBackend::empty());

    let body = common::expect_json(
        common::post_json(
            app,
            "/api/v1/projects",
            serde_json::json!({ "name": "  " }),
        )
        .await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert_eq!(body["code"], "BAD_REQUEST");
}
