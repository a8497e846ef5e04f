//! Ordering and concurrency-control behaviour of the scene repository.

use sceneforge_db::models::project::CreateProject;
use sceneforge_db::models::scene::{CreateScene, Scene, UpdateSceneContent};
use sceneforge_db::repositories::{ProjectRepo, SceneRepo};
use sqlx::PgPool;

async fn seed_project(pool: &PgPool) -> i64 {
    ProjectRepo::create(
        pool,
        &CreateProject {
            name: "ordering-test".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn seed_scene(pool: &PgPool, project_id: i64, content: &str) -> Scene {
    SceneRepo::create_at_end(
        pool,
        &CreateScene {
            project_id,
            content: content.to_string(),
            duration_frames: 150,
            structured_metadata: None,
        },
    )
    .await
    .unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_at_end_assigns_contiguous_positions(pool: PgPool) {
    let project_id = seed_project(&pool).await;

    for i in 0..4 {
        let scene = seed_scene(&pool, project_id, &format!("<Scene><Title text=\"s{i}\"/></Scene>")).await;
        assert_eq!(scene.position, i);
    }

    let scenes = SceneRepo::list_by_project(&pool, project_id).await.unwrap();
    let positions: Vec<i32> = scenes.iter().map(|s| s.position).collect();
    assert_eq!(positions, vec![0, 1, 2, 3]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_positions_are_scoped_per_project(pool: PgPool) {
    let a = seed_project(&pool).await;
    let b = seed_project(&pool).await;

    seed_scene(&pool, a, "<Scene><Title text=\"a0\"/></Scene>").await;
    let first_in_b = seed_scene(&pool, b, "<Scene><Title text=\"b0\"/></Scene>").await;

    assert_eq!(first_in_b.position, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_and_renumber_closes_the_gap(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    let a = seed_scene(&pool, project_id, "<Scene><Title text=\"a\"/></Scene>").await;
    let b = seed_scene(&pool, project_id, "<Scene><Title text=\"b\"/></Scene>").await;
    let c = seed_scene(&pool, project_id, "<Scene><Title text=\"c\"/></Scene>").await;

    let removed = SceneRepo::delete_and_renumber(&pool, b.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(removed.id, b.id);

    let scenes = SceneRepo::list_by_project(&pool, project_id).await.unwrap();
    assert_eq!(scenes.len(), 2);
    assert_eq!((scenes[0].id, scenes[0].position), (a.id, 0));
    assert_eq!((scenes[1].id, scenes[1].position), (c.id, 1));

    // The shifted scene took a version bump, so an edit prepared against
    // the pre-delete row now misses.
    assert_eq!(scenes[1].version_token, c.version_token + 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_insert_and_delete_keep_positions_contiguous(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    let a = seed_scene(&pool, project_id, "<Scene><Title text=\"a\"/></Scene>").await;
    let b = seed_scene(&pool, project_id, "<Scene><Title text=\"b\"/></Scene>").await;
    seed_scene(&pool, project_id, "<Scene><Title text=\"c\"/></Scene>").await;

    // An insert counting rows while a delete renumbers the tail must not
    // land past the gap. The per-project order lock serializes the two, so
    // either outcome order leaves positions contiguous.
    let new_scene = CreateScene {
        project_id,
        content: "<Scene><Title text=\"d\"/></Scene>".to_string(),
        duration_frames: 150,
        structured_metadata: None,
    };
    let insert = SceneRepo::create_at_end(&pool, &new_scene);
    let delete = SceneRepo::delete_and_renumber(&pool, b.id);
    let (inserted, removed) = tokio::join!(insert, delete);
    inserted.unwrap();
    assert!(removed.unwrap().is_some());

    let scenes = SceneRepo::list_by_project(&pool, project_id).await.unwrap();
    let positions: Vec<i32> = scenes.iter().map(|s| s.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
    assert_eq!(scenes[0].id, a.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_unknown_id_returns_none(pool: PgPool) {
    let result = SceneRepo::delete_and_renumber(&pool, 999_999).await.unwrap();
    assert!(result.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_versioned_update_applies_and_bumps_token(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    let scene = seed_scene(&pool, project_id, "<Scene><Title text=\"v1\"/></Scene>").await;

    let updated = SceneRepo::update_versioned(
        &pool,
        scene.id,
        &UpdateSceneContent {
            content: "<Scene><Title text=\"v2\"/></Scene>".to_string(),
            duration_frames: Some(200),
            structured_metadata: None,
            expected_version: scene.version_token,
        },
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(updated.content, "<Scene><Title text=\"v2\"/></Scene>");
    assert_eq!(updated.duration_frames, 200);
    assert_eq!(updated.version_token, scene.version_token + 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_versioned_update_with_stale_token_misses(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    let scene = seed_scene(&pool, project_id, "<Scene><Title text=\"v1\"/></Scene>").await;

    // First writer wins.
    SceneRepo::update_versioned(
        &pool,
        scene.id,
        &UpdateSceneContent {
            content: "<Scene><Title text=\"winner\"/></Scene>".to_string(),
            duration_frames: None,
            structured_metadata: None,
            expected_version: scene.version_token,
        },
    )
    .await
    .unwrap()
    .unwrap();

    // Second writer carries the now-stale token and must miss.
    let stale = SceneRepo::update_versioned(
        &pool,
        scene.id,
        &UpdateSceneContent {
            content: "<Scene><Title text=\"loser\"/></Scene>".to_string(),
            duration_frames: None,
            structured_metadata: None,
            expected_version: scene.version_token,
        },
    )
    .await
    .unwrap();
    assert!(stale.is_none());

    let current = SceneRepo::find_by_id(&pool, scene.id).await.unwrap().unwrap();
    assert_eq!(current.content, "<Scene><Title text=\"winner\"/></Scene>");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duration_survives_content_only_update(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    let scene = seed_scene(&pool, project_id, "<Scene><Title text=\"v1\"/></Scene>").await;

    let updated = SceneRepo::update_versioned(
        &pool,
        scene.id,
        &UpdateSceneContent {
            content: "<Scene><Title text=\"v2\"/></Scene>".to_string(),
            duration_frames: None,
            structured_metadata: None,
            expected_version: scene.version_token,
        },
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(updated.duration_frames, scene.duration_frames);
}
