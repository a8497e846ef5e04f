//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the hand-off point between the request path and
//! post-commit side effects: the orchestrator publishes and returns,
//! the [`BackgroundDispatcher`](crate::BackgroundDispatcher) consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use sceneforge_core::types::DbId;

// ---------------------------------------------------------------------------
// DomainEvent
// ---------------------------------------------------------------------------

/// Scene mutation event names.
pub const SCENE_CREATED: &str = "scene.created";
pub const SCENE_UPDATED: &str = "scene.updated";
pub const SCENE_DELETED: &str = "scene.deleted";

/// A committed mutation, described for downstream consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Dot-separated event name, e.g. `"scene.created"`.
    pub event_type: String,

    /// Source entity kind (`"scene"` for all mutation events).
    pub source_entity_type: Option<String>,

    /// Source entity database id.
    pub source_entity_id: Option<DbId>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent {
    /// Create a new event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach a source entity to the event.
    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// A committed scene insert. Carries the content so the search index
    /// can be refreshed without re-reading the row.
    pub fn scene_created(scene_id: DbId, project_id: DbId, content: &str) -> Self {
        Self::new(SCENE_CREATED)
            .with_source("scene", scene_id)
            .with_payload(serde_json::json!({
                "projectId": project_id,
                "content": content,
            }))
    }

    /// A committed scene update.
    pub fn scene_updated(scene_id: DbId, project_id: DbId, content: &str) -> Self {
        Self::new(SCENE_UPDATED)
            .with_source("scene", scene_id)
            .with_payload(serde_json::json!({
                "projectId": project_id,
                "content": content,
            }))
    }

    /// A committed scene delete.
    pub fn scene_deleted(scene_id: DbId, project_id: DbId) -> Self {
        Self::new(SCENE_DELETED)
            .with_source("scene", scene_id)
            .with_payload(serde_json::json!({ "projectId": project_id }))
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so any number of subscribers can
/// independently receive every published [`DomainEvent`]. Shared via
/// `Arc<EventBus>` across the application.
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed messages are
    /// dropped and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With zero subscribers the event is silently dropped; publishing
    /// never blocks and never fails the request path.
    pub fn publish(&self, event: DomainEvent) {
        // Ignore the SendError; it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
