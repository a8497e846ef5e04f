//! Shared response envelope types for API handlers.
//!
//! Plain CRUD responses use a `{ "data": ... }` envelope. The generate
//! endpoint returns the richer
//! [`ResponseEnvelope`](sceneforge_engine::envelope::ResponseEnvelope)
//! built by the orchestrator; it is serialized as-is.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
