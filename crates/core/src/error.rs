use crate::types::DbId;

/// Domain error taxonomy shared by every crate in the workspace.
///
/// Lower components return these typed results; only the orchestrator
/// turns them into the final response envelope, and only the api crate
/// turns them into HTTP statuses.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Generation failed: {message}")]
    Generation { message: String, retryable: bool },

    #[error("Persistence failed: {0}")]
    Persistence(String),
}

impl CoreError {
    /// Create a retryable generation error (backend failures, timeouts,
    /// unparsable output after the bounded retry).
    pub fn generation(message: impl Into<String>) -> Self {
        CoreError::Generation {
            message: message.into(),
            retryable: true,
        }
    }

    /// Stable machine-readable kind string used in the response envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "ValidationError",
            CoreError::NotFound { .. } => "NotFoundError",
            CoreError::Conflict(_) => "ConflictError",
            CoreError::Generation { .. } => "GenerationError",
            CoreError::Persistence(_) => "PersistenceError",
        }
    }

    /// Whether the caller may reasonably retry the same request.
    pub fn retryable(&self) -> bool {
        match self {
            CoreError::Generation { retryable, .. } => *retryable,
            CoreError::Persistence(_) => true,
            _ => false,
        }
    }
}
