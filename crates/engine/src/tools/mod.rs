//! The pure content-generation tools.
//!
//! Every tool takes a plain input struct and returns a typed result. The
//! only I/O a tool may perform is the injected [`CompletionBackend`] call;
//! none of them sees a database handle. Purity is with respect to side
//! effects, not output bytes; the backend is non-deterministic, so each
//! tool validates the structure of what it gets back and retries once
//! with the validation failure as a correction hint.
//!
//! [`CompletionBackend`]: sceneforge_genai::CompletionBackend

pub mod add;
pub mod delete;
pub mod edit;

#[cfg(test)]
pub(crate) mod testutil;

use serde::Deserialize;

use sceneforge_core::error::CoreError;
use sceneforge_genai::BackendError;

/// Wire shape of a generation-tool response from the backend.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenPayload {
    pub content: String,
    #[serde(default)]
    pub duration_frames: Option<i32>,
    #[serde(default)]
    pub structured_metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub changes_applied: Vec<String>,
    #[serde(default)]
    pub rationale: Option<String>,
    #[serde(default)]
    pub user_facing_message: Option<String>,
}

/// Parse a backend reply into a [`GenPayload`], tolerating prose or code
/// fences around the JSON object.
pub(crate) fn parse_payload(raw: &str) -> Result<GenPayload, CoreError> {
    let trimmed = match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if end > start => &raw[start..=end],
        _ => raw,
    };
    serde_json::from_str(trimmed)
        .map_err(|e| CoreError::generation(format!("Tool response was not valid JSON: {e}")))
}

pub(crate) fn to_core(err: BackendError) -> CoreError {
    CoreError::generation(err.to_string())
}
