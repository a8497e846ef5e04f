//! Repository for the `scene_search` side table.
//!
//! The index is maintained asynchronously by the background dispatcher
//! after a commit, so it may briefly trail the `scenes` table. That is
//! acceptable: it backs search, not the source of truth.

use sqlx::PgPool;

use sceneforge_core::types::DbId;

/// Upsert/remove access to the search index.
pub struct SearchIndexRepo;

impl SearchIndexRepo {
    /// Insert or refresh the index row for a scene.
    pub async fn upsert(
        pool: &PgPool,
        scene_id: DbId,
        project_id: DbId,
        content_text: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO scene_search (scene_id, project_id, content_text, updated_at)
             VALUES ($1, $2, $3, NOW())
             ON CONFLICT (scene_id) DO UPDATE
                 SET content_text = EXCLUDED.content_text,
                     updated_at = NOW()",
        )
        .bind(scene_id)
        .bind(project_id)
        .bind(content_text)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Drop the index row for a deleted scene. Missing rows are fine.
    pub async fn remove(pool: &PgPool, scene_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM scene_search WHERE scene_id = $1")
            .bind(scene_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
