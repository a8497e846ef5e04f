//! Fire-and-forget consumer for post-commit side effects.
//!
//! One long-lived task subscribed to the [`EventBus`](crate::EventBus).
//! Per event it: writes the audit row, maintains the search index, and
//! emits the analytics log line. Each side effect catches and logs its
//! own errors; nothing here can change a request's outcome, which has
//! already been committed and returned by the time the event arrives.

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use sceneforge_db::repositories::{EventRepo, SearchIndexRepo};
use sceneforge_db::DbPool;

use crate::bus::{DomainEvent, SCENE_CREATED, SCENE_DELETED, SCENE_UPDATED};

/// Background service consuming committed mutation events.
pub struct BackgroundDispatcher;

impl BackgroundDispatcher {
    /// Run the dispatch loop until the bus closes or `cancel` fires.
    pub async fn run(
        pool: DbPool,
        mut receiver: broadcast::Receiver<DomainEvent>,
        cancel: CancellationToken,
    ) {
        tracing::info!("Background dispatcher started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Background dispatcher shutting down");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(event) => Self::handle(&pool, &event).await,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Dispatcher lagged, some events were dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event bus closed, dispatcher shutting down");
                        break;
                    }
                },
            }
        }
    }

    /// Process one event. Side effects are independent: a failure in one
    /// is logged and the rest still run.
    async fn handle(pool: &DbPool, event: &DomainEvent) {
        if let Err(e) = EventRepo::insert(
            pool,
            &event.event_type,
            event.source_entity_type.as_deref(),
            event.source_entity_id,
            &event.payload,
        )
        .await
        {
            tracing::error!(error = %e, event_type = %event.event_type, "Failed to persist event");
        }

        if let Err(e) = Self::update_search_index(pool, event).await {
            tracing::error!(error = %e, event_type = %event.event_type, "Failed to update search index");
        }

        // Analytics sink is the structured log stream.
        tracing::info!(
            event_type = %event.event_type,
            entity_id = event.source_entity_id,
            "analytics.event"
        );
    }

    async fn update_search_index(pool: &DbPool, event: &DomainEvent) -> Result<(), sqlx::Error> {
        let Some(scene_id) = event.source_entity_id else {
            return Ok(());
        };

        match event.event_type.as_str() {
            SCENE_CREATED | SCENE_UPDATED => {
                let project_id = event.payload["projectId"].as_i64().unwrap_or_default();
                let content = event.payload["content"].as_str().unwrap_or_default();
                SearchIndexRepo::upsert(pool, scene_id, project_id, content).await
            }
            SCENE_DELETED => SearchIndexRepo::remove(pool, scene_id).await,
            _ => Ok(()),
        }
    }
}
