//! The completion-backend seam.

use async_trait::async_trait;

/// Message author role for a chat completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    /// Wire name used by OpenAI-compatible APIs.
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One message of a chat-completion request.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Errors from the generation backend. All variants map to the domain's
/// `GenerationError` at the orchestrator boundary.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Transport-level failure or non-2xx response.
    #[error("Backend request failed: {0}")]
    Http(String),

    /// The bounded request timeout elapsed.
    #[error("Backend request timed out")]
    Timeout,

    /// The response body did not have the expected shape.
    #[error("Backend response was malformed: {0}")]
    Malformed(String),
}

/// A text-completion service.
///
/// Implementations must be safe for concurrent use from many in-flight
/// requests; [`GenAiClient`](crate::GenAiClient) is (reqwest pools
/// connections internally). Output is non-deterministic by nature;
/// callers validate structure, not bytes.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Run one chat completion and return the assistant message text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, BackendError>;
}
