//! Scene entity model and DTOs.
//!
//! `content` is the canonical field name for scene component source; it is
//! never aliased. `position` is zero-based and kept contiguous per project
//! by [`SceneRepo`](crate::repositories::SceneRepo). `version_token`
//! increments on every successful write and backs optimistic concurrency.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use sceneforge_core::types::{DbId, Timestamp};

/// A row from the `scenes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: DbId,
    pub project_id: DbId,
    pub content: String,
    pub duration_frames: i32,
    pub position: i32,
    pub structured_metadata: serde_json::Value,
    pub version_token: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new scene at the end of a project.
///
/// `position` is not part of the DTO: it is computed inside the inserting
/// transaction from the current scene count.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateScene {
    pub project_id: DbId,
    pub content: String,
    pub duration_frames: i32,
    /// Defaults to an empty object if omitted.
    pub structured_metadata: Option<serde_json::Value>,
}

/// DTO for a version-checked content update.
///
/// The write applies only if the row's `version_token` still equals
/// `expected_version`; a stale token is reported as a conflict by the
/// repository returning `None`.
#[derive(Debug, Clone)]
pub struct UpdateSceneContent {
    pub content: String,
    /// `None` keeps the current duration.
    pub duration_frames: Option<i32>,
    /// `None` keeps the current metadata.
    pub structured_metadata: Option<serde_json::Value>,
    pub expected_version: i64,
}
