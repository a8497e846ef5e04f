pub mod health;
pub mod project;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /projects                                POST create
/// /projects/{id}                           GET
/// /projects/{id}/generate                  POST natural-language mutation
/// /projects/{id}/scenes                    GET ordered listing
/// /projects/{id}/scenes/{scene_id}         GET
/// /projects/{id}/messages                  GET recent conversation
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/projects", project::router())
}
