//! Read-side handlers for `/projects/{id}/messages`.

use axum::extract::{Path, Query, State};
use axum::Json;
use sceneforge_core::types::DbId;
use sceneforge_db::models::message::Message;
use sceneforge_db::repositories::MessageRepo;
use serde::Deserialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
}

/// GET /api/v1/projects/{id}/messages?limit=N
///
/// The most recent messages, oldest first.
pub async fn list_recent(
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<DataResponse<Vec<Message>>>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIMIT)
        .clamp(1, MAX_LIMIT);
    let messages = MessageRepo::list_recent(&state.pool, project_id, limit).await?;
    Ok(Json(DataResponse { data: messages }))
}
