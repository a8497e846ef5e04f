//! HTTP-level tests for the generate endpoint.
//!
//! The backend is scripted per test, in call order: decision first, then
//! the tool payload where one runs. Outcomes land in the envelope with
//! HTTP 200; only request-shape problems earn a 4xx.

mod common;

use axum::http::StatusCode;
use common::ScriptedBackend;
use sqlx::PgPool;

async fn create_project(app: axum::Router) -> i64 {
    let body = common::expect_json(
        common::post_json(
            app,
            "/api/v1/projects",
            serde_json::json!({ "name": "gen-test" }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    body["id"].as_i64().unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn generate_add_returns_envelope_with_scene(pool: PgPool) {
    let backend = ScriptedBackend::replying([
        r#"{"tool": "add", "confidence": 0.9, "rationale": "fresh scene",
            "userFacingMessage": "Adding a title card."}"#,
        r#"{"content": "<Scene><Title text=\"hello\"/></Scene>", "durationFrames": 90,
            "rationale": "simple card", "userFacingMessage": "Added a title card."}"#,
    ]);
    let app = common::build_test_app(pool, backend);
    let project_id = create_project(app.clone()).await;

    let body = common::expect_json(
        common::post_json(
            app.clone(),
            &format!("/api/v1/projects/{project_id}/generate"),
            serde_json::json!({ "prompt": "add a title card saying hello" }),
        )
        .await,
        StatusCode::OK,
    )
    .await;

    assert_eq!(body["meta"]["success"], true);
    assert_eq!(body["meta"]["operation"], "scene.create");
    assert_eq!(body["data"]["position"], 0);
    assert_eq!(body["data"]["durationFrames"], 90);
    assert_eq!(body["context"]["userFacingMessage"], "Added a title card.");
    assert!(body["meta"]["requestId"].is_string());

    // The new scene is visible through the read side.
    let scenes = common::expect_json(
        common::get(app, &format!("/api/v1/projects/{project_id}/scenes")).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(scenes["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn generate_with_empty_prompt_is_a_bad_request(pool: PgPool) {
    let app = common::build_test_app(pool, ScriptedBackend::empty());
    let project_id = create_project(app.clone()).await;

    let response = common::post_json(
        app,
        &format!("/api/v1/projects/{project_id}/generate"),
        serde_json::json!({ "prompt": "   " }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn generate_failure_is_carried_in_the_envelope(pool: PgPool) {
    // Script exhaustion surfaces as a backend failure on the decision call.
    let app = common::build_test_app(pool, ScriptedBackend::empty());
    let project_id = create_project(app.clone()).await;

    let body = common::expect_json(
        common::post_json(
            app,
            &format!("/api/v1/projects/{project_id}/generate"),
            serde_json::json!({ "prompt": "add something" }),
        )
        .await,
        StatusCode::OK,
    )
    .await;

    assert_eq!(body["meta"]["success"], false);
    assert!(body["meta"]["operation"].is_null());
    assert_eq!(body["error"]["kind"], "GenerationError");
    assert_eq!(body["error"]["retryable"], true);
    assert!(body["context"]["userFacingMessage"].is_string());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn generate_against_missing_project_is_envelope_not_found(pool: PgPool) {
    let app = common::build_test_app(pool, ScriptedBackend::empty());

    let body = common::expect_json(
        common::post_json(
            app,
            "/api/v1/projects/424242/generate",
            serde_json::json!({ "prompt": "add something" }),
        )
        .await,
        StatusCode::OK,
    )
    .await;

    assert_eq!(body["meta"]["success"], false);
    assert_eq!(body["error"]["kind"], "NotFoundError");
}
