use std::sync::Arc;

use sceneforge_engine::Orchestrator;
use sceneforge_events::EventBus;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: sceneforge_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The generation pipeline. One instance serves all requests.
    pub orchestrator: Arc<Orchestrator>,
    /// Centralized event bus for publishing domain events.
    pub event_bus: Arc<EventBus>,
}
