//! The canonical response envelope.
//!
//! Built by the orchestrator and nowhere else, for every outcome,
//! success or failure. Wire keys are camelCase per the external API
//! contract.

use std::time::Instant;

use serde::Serialize;
use uuid::Uuid;

use sceneforge_core::error::CoreError;
use sceneforge_core::types::DbId;
use sceneforge_db::models::scene::Scene;

/// Which mutation the request resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operation {
    #[serde(rename = "scene.create")]
    SceneCreate,
    #[serde(rename = "scene.update")]
    SceneUpdate,
    #[serde(rename = "scene.delete")]
    SceneDelete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::SceneCreate => "scene.create",
            Operation::SceneUpdate => "scene.update",
            Operation::SceneDelete => "scene.delete",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    pub request_id: Uuid,
    pub timestamp_ms: i64,
    /// `None` when the request failed before an operation was decided.
    pub operation: Option<Operation>,
    pub success: bool,
    pub affected_ids: Vec<DbId>,
    pub execution_time_ms: u64,
}

/// Decision-side context surfaced to the caller. `confidence` is
/// reported so lower-certainty UI can be shown; it never gates.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseContext {
    pub rationale: String,
    pub user_facing_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseError {
    pub kind: String,
    pub message: String,
    pub retryable: bool,
}

/// The canonical envelope returned for every generate request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub data: Option<Scene>,
    pub meta: ResponseMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ResponseContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl ResponseEnvelope {
    /// A successful outcome.
    pub fn success(
        request_id: Uuid,
        started: Instant,
        operation: Operation,
        data: Option<Scene>,
        affected_ids: Vec<DbId>,
        context: ResponseContext,
    ) -> Self {
        Self {
            data,
            meta: ResponseMeta {
                request_id,
                timestamp_ms: chrono::Utc::now().timestamp_millis(),
                operation: Some(operation),
                success: true,
                affected_ids,
                execution_time_ms: started.elapsed().as_millis() as u64,
            },
            context: Some(context),
            error: None,
        }
    }

    /// A failed outcome. Every error carries a human-readable message.
    pub fn failure(
        request_id: Uuid,
        started: Instant,
        operation: Option<Operation>,
        err: &CoreError,
        user_facing_message: String,
    ) -> Self {
        Self {
            data: None,
            meta: ResponseMeta {
                request_id,
                timestamp_ms: chrono::Utc::now().timestamp_millis(),
                operation,
                success: false,
                affected_ids: Vec::new(),
                execution_time_ms: started.elapsed().as_millis() as u64,
            },
            context: Some(ResponseContext {
                rationale: String::new(),
                user_facing_message,
                confidence: None,
            }),
            error: Some(ResponseError {
                kind: err.kind().to_string(),
                message: err.to_string(),
                retryable: err.retryable(),
            }),
        }
    }
}
