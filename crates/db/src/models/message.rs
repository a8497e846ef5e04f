//! Conversation message model. The `messages` table is append-only.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use sceneforge_core::types::{DbId, Timestamp};

/// Message author roles (stored as TEXT, constrained in the schema).
pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";

/// A row from the `messages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: DbId,
    pub project_id: DbId,
    pub role: String,
    pub text: String,
    pub image_refs: Vec<String>,
    pub created_at: Timestamp,
}

/// DTO for appending a message.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    pub project_id: DbId,
    pub role: String,
    pub text: String,
    pub image_refs: Vec<String>,
}

impl NewMessage {
    /// A user message, optionally carrying image references.
    pub fn user(project_id: DbId, text: impl Into<String>, image_refs: Vec<String>) -> Self {
        Self {
            project_id,
            role: ROLE_USER.to_string(),
            text: text.into(),
            image_refs,
        }
    }

    /// An assistant message. Assistant turns never carry images.
    pub fn assistant(project_id: DbId, text: impl Into<String>) -> Self {
        Self {
            project_id,
            role: ROLE_ASSISTANT.to_string(),
            text: text.into(),
            image_refs: Vec::new(),
        }
    }
}
