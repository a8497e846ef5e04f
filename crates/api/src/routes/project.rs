//! Route definitions for project-scoped resources.
//!
//! Mounted at `/projects`. The generate endpoint is the only mutation
//! path for scenes; the rest of the tree is read-side plumbing for
//! clients rendering project state.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{generate, message, project, scene};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// POST   /                            create
/// GET    /{id}                        get_by_id
/// POST   /{id}/generate               generate (scene mutation)
/// GET    /{id}/scenes                 list (position order)
/// GET    /{id}/scenes/{scene_id}      get_by_id
/// GET    /{id}/messages               list_recent
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(project::create))
        .route("/{id}", get(project::get_by_id))
        .route("/{id}/generate", post(generate::generate))
        .route("/{id}/scenes", get(scene::list_by_project))
        .route("/{id}/scenes/{scene_id}", get(scene::get_by_id))
        .route("/{id}/messages", get(message::list_recent))
}
