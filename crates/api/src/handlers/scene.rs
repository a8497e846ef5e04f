//! Read-side handlers for `/projects/{id}/scenes`.
//!
//! Scenes are only ever mutated through the generate endpoint; these
//! handlers exist so clients can render current project state.

use axum::extract::{Path, State};
use axum::Json;
use sceneforge_core::error::CoreError;
use sceneforge_core::types::DbId;
use sceneforge_db::models::scene::Scene;
use sceneforge_db::repositories::SceneRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/projects/{id}/scenes
///
/// Scenes in position order, contiguous from zero.
pub async fn list_by_project(
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Scene>>>> {
    let scenes = SceneRepo::list_by_project(&state.pool, project_id).await?;
    Ok(Json(DataResponse { data: scenes }))
}

/// GET /api/v1/projects/{id}/scenes/{scene_id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path((_project_id, scene_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<Scene>> {
    let scene = SceneRepo::find_by_id(&state.pool, scene_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Scene",
            id: scene_id,
        }))?;
    Ok(Json(scene))
}
