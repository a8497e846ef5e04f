//! Repository for the `events` audit/analytics table.
//!
//! Written only by the background dispatcher; the request path never
//! touches this table.

use sqlx::PgPool;

use sceneforge_core::types::DbId;

/// Insert-only access to the `events` table.
pub struct EventRepo;

impl EventRepo {
    /// Insert one event row, returning its id.
    pub async fn insert(
        pool: &PgPool,
        event_type: &str,
        source_entity_type: Option<&str>,
        source_entity_id: Option<DbId>,
        payload: &serde_json::Value,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO events (event_type, source_entity_type, source_entity_id, payload)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(event_type)
        .bind(source_entity_type)
        .bind(source_entity_id)
        .bind(payload)
        .fetch_one(pool)
        .await
    }

    /// Count events of a given type. Used by dispatcher tests to observe
    /// the audit trail.
    pub async fn count_by_type(pool: &PgPool, event_type: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM events WHERE event_type = $1")
            .bind(event_type)
            .fetch_one(pool)
            .await
    }
}
