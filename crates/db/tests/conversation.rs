//! Conversation history behaviour of the message repository.

use sceneforge_db::models::message::{NewMessage, ROLE_ASSISTANT, ROLE_USER};
use sceneforge_db::models::project::CreateProject;
use sceneforge_db::repositories::{MessageRepo, ProjectRepo};
use sqlx::PgPool;

async fn seed_project(pool: &PgPool) -> i64 {
    ProjectRepo::create(
        pool,
        &CreateProject {
            name: "conversation-test".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_append_records_roles_and_image_refs(pool: PgPool) {
    let project_id = seed_project(&pool).await;

    let user = MessageRepo::append(
        &pool,
        &NewMessage::user(project_id, "make it blue", vec!["ref-1".to_string()]),
    )
    .await
    .unwrap();
    let assistant = MessageRepo::append(&pool, &NewMessage::assistant(project_id, "Done."))
        .await
        .unwrap();

    assert_eq!(user.role, ROLE_USER);
    assert_eq!(user.image_refs, vec!["ref-1".to_string()]);
    assert_eq!(assistant.role, ROLE_ASSISTANT);
    assert!(assistant.image_refs.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_recent_returns_newest_window_oldest_first(pool: PgPool) {
    let project_id = seed_project(&pool).await;

    for i in 0..5 {
        MessageRepo::append(
            &pool,
            &NewMessage::user(project_id, format!("message {i}"), Vec::new()),
        )
        .await
        .unwrap();
    }

    let window = MessageRepo::list_recent(&pool, project_id, 3).await.unwrap();
    let texts: Vec<&str> = window.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["message 2", "message 3", "message 4"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_recent_is_project_scoped(pool: PgPool) {
    let a = seed_project(&pool).await;
    let b = seed_project(&pool).await;

    MessageRepo::append(&pool, &NewMessage::user(a, "for a", Vec::new()))
        .await
        .unwrap();

    let window = MessageRepo::list_recent(&pool, b, 10).await.unwrap();
    assert!(window.is_empty());
}
