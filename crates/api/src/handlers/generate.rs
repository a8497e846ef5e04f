//! The generate endpoint: one natural-language request in, one
//! canonical response envelope out.
//!
//! The handler is thin. All sequencing, retries, and error folding live
//! in the orchestrator; the envelope's `meta.success` already encodes
//! the outcome, so the HTTP status only distinguishes request-shape
//! problems (4xx via [`AppError`]) from processed requests (200).

use axum::extract::{Path, State};
use axum::Json;
use sceneforge_core::types::DbId;
use sceneforge_engine::envelope::ResponseEnvelope;
use sceneforge_engine::GenerateRequest;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Request body for POST /api/v1/projects/{id}/generate.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody {
    pub prompt: String,
    #[serde(default)]
    pub image_refs: Vec<String>,
    /// Explicit target scene; wins over the model's choice.
    #[serde(default)]
    pub target_scene_id: Option<DbId>,
}

/// POST /api/v1/projects/{id}/generate
pub async fn generate(
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(body): Json<GenerateBody>,
) -> AppResult<Json<ResponseEnvelope>> {
    if body.prompt.trim().is_empty() {
        return Err(AppError::BadRequest("prompt is required".into()));
    }

    let envelope = state
        .orchestrator
        .handle(GenerateRequest {
            project_id,
            prompt: body.prompt,
            image_refs: body.image_refs,
            target_scene_id: body.target_scene_id,
        })
        .await;

    Ok(Json(envelope))
}
