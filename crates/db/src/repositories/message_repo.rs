//! Repository for the append-only `messages` table.

use sqlx::PgPool;

use sceneforge_core::types::DbId;

use crate::models::message::{Message, NewMessage};

const COLUMNS: &str = "id, project_id, role, text, image_refs, created_at";

/// Append and read conversation messages. There is deliberately no update
/// or delete here; the log is immutable.
pub struct MessageRepo;

impl MessageRepo {
    /// Append a message, returning the stored row.
    pub async fn append(pool: &PgPool, input: &NewMessage) -> Result<Message, sqlx::Error> {
        let query = format!(
            "INSERT INTO messages (project_id, role, text, image_refs)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(input.project_id)
            .bind(&input.role)
            .bind(&input.text)
            .bind(&input.image_refs)
            .fetch_one(pool)
            .await
    }

    /// The last `limit` messages of a project, oldest first.
    pub async fn list_recent(
        pool: &PgPool,
        project_id: DbId,
        limit: i64,
    ) -> Result<Vec<Message>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM (
                 SELECT {COLUMNS} FROM messages
                 WHERE project_id = $1
                 ORDER BY created_at DESC, id DESC
                 LIMIT $2
             ) recent
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(project_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
