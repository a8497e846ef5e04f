//! Repository for the `scenes` table.
//!
//! Invariants owned here:
//! - `position` values per project are zero-based, contiguous, unique.
//!   Inserts compute their position from the scene count; deletes renumber
//!   the tail inside one transaction. Both run under a per-project advisory
//!   lock so a concurrent insert and delete cannot interleave their count
//!   and renumber steps and leave a gap.
//! - Every successful write increments `version_token`. Content updates
//!   are compare-and-swap on the token so a stale writer never silently
//!   overwrites a newer version.

use sqlx::PgPool;

use sceneforge_core::types::DbId;

use crate::models::scene::{CreateScene, Scene, UpdateSceneContent};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, content, duration_frames, position, \
    structured_metadata, version_token, created_at, updated_at";

/// Provides ordered, version-checked operations for scenes.
pub struct SceneRepo;

impl SceneRepo {
    /// Insert a new scene at the end of the project's order.
    ///
    /// The position is computed from `COUNT(*)` under the project's order
    /// lock, so a concurrent insert or delete-and-renumber on the same
    /// project serializes against it instead of racing the count. The
    /// deferred unique constraint on `(project_id, position)` remains as a
    /// backstop for writes that bypass this repository.
    pub async fn create_at_end(pool: &PgPool, input: &CreateScene) -> Result<Scene, sqlx::Error> {
        let query = format!(
            "INSERT INTO scenes (project_id, content, duration_frames, position, structured_metadata)
             VALUES ($1, $2, $3,
                 (SELECT COUNT(*) FROM scenes WHERE project_id = $1),
                 COALESCE($4, '{{}}'::jsonb))
             RETURNING {COLUMNS}"
        );

        let mut tx = pool.begin().await?;
        lock_project_order(&mut tx, input.project_id).await?;

        let scene = sqlx::query_as::<_, Scene>(&query)
            .bind(input.project_id)
            .bind(&input.content)
            .bind(input.duration_frames)
            .bind(&input.structured_metadata)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(scene)
    }

    /// Find a scene by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Scene>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scenes WHERE id = $1");
        sqlx::query_as::<_, Scene>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all scenes of a project in display order.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<Scene>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM scenes WHERE project_id = $1 ORDER BY position ASC"
        );
        sqlx::query_as::<_, Scene>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Apply a version-checked content update.
    ///
    /// Returns `None` when no row matched, which means either the scene is
    /// gone or `expected_version` is stale. Callers that fetched the row
    /// first treat `None` as an optimistic-concurrency conflict.
    pub async fn update_versioned(
        pool: &PgPool,
        id: DbId,
        input: &UpdateSceneContent,
    ) -> Result<Option<Scene>, sqlx::Error> {
        let query = format!(
            "UPDATE scenes SET
                content = $3,
                duration_frames = COALESCE($4, duration_frames),
                structured_metadata = COALESCE($5, structured_metadata),
                version_token = version_token + 1,
                updated_at = NOW()
             WHERE id = $1 AND version_token = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Scene>(&query)
            .bind(id)
            .bind(input.expected_version)
            .bind(&input.content)
            .bind(input.duration_frames)
            .bind(&input.structured_metadata)
            .fetch_optional(pool)
            .await
    }

    /// Delete a scene and close the gap it leaves, in one transaction.
    ///
    /// Every scene after the removed position shifts down by one (with a
    /// version bump, so in-flight edits against shifted scenes conflict
    /// and re-decide instead of writing against a moved row). Readers
    /// never observe a gap or a duplicate position.
    ///
    /// Returns the removed scene, or `None` if the id did not exist.
    pub async fn delete_and_renumber(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Scene>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // The order lock must be held before the row disappears, otherwise a
        // concurrent insert can count the doomed row and land past the gap.
        let project_id: Option<DbId> =
            sqlx::query_scalar("SELECT project_id FROM scenes WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(project_id) = project_id else {
            tx.rollback().await?;
            return Ok(None);
        };
        lock_project_order(&mut tx, project_id).await?;

        let delete_query = format!("DELETE FROM scenes WHERE id = $1 RETURNING {COLUMNS}");
        let removed = sqlx::query_as::<_, Scene>(&delete_query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(removed) = removed else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            "UPDATE scenes SET
                position = position - 1,
                version_token = version_token + 1,
                updated_at = NOW()
             WHERE project_id = $1 AND position > $2",
        )
        .bind(removed.project_id)
        .bind(removed.position)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(removed))
    }
}

/// Take the per-project ordering lock for the rest of the transaction.
///
/// Keyed on the project id; released automatically at commit or rollback.
async fn lock_project_order(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    project_id: DbId,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(project_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
