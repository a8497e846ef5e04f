//! Read-only aggregation of project state for the decision step.
//!
//! Context building is best-effort by contract: a failed sub-fetch logs a
//! warning and leaves its field empty rather than failing the request.
//! The sub-fetches are independent reads and run concurrently.

use serde::Serialize;

use sceneforge_core::decision::SceneRef;
use sceneforge_core::types::DbId;
use sceneforge_db::models::message::Message;
use sceneforge_db::repositories::{MessageRepo, SceneRepo};
use sceneforge_db::DbPool;
use sceneforge_genai::vision::{summarize_images, ImageSummary};
use sceneforge_genai::CompletionBackend;

/// Characters of scene content kept in the prompt-facing digest.
const FINGERPRINT_CHARS: usize = 160;

/// A compact, prompt-friendly view of one scene.
#[derive(Debug, Clone, Serialize)]
pub struct SceneDigest {
    pub id: DbId,
    pub position: i32,
    pub duration_frames: i32,
    /// Leading slice of the content, enough to identify the scene.
    pub content_fingerprint: String,
}

/// Everything the decision engine gets to see.
#[derive(Debug, Default)]
pub struct RequestContext {
    /// Ordered scene listing used for target resolution.
    pub scene_refs: Vec<SceneRef>,
    /// Ordered digests used in the decision prompt.
    pub scene_digests: Vec<SceneDigest>,
    /// Full content of the last scene, handed to the Add tool for
    /// visual continuity.
    pub last_scene_content: Option<String>,
    /// Last N conversation messages, oldest first.
    pub recent_messages: Vec<Message>,
    /// Vision summary, present only when the request carried image refs
    /// and the analysis succeeded.
    pub image_summary: Option<ImageSummary>,
}

/// Builds a [`RequestContext`]. Read-only; never writes.
pub struct ContextBuilder;

impl ContextBuilder {
    /// Gather scenes, recent messages, and (if images are attached) a
    /// vision summary, concurrently.
    pub async fn build(
        pool: &DbPool,
        backend: &dyn CompletionBackend,
        project_id: DbId,
        image_refs: &[String],
        message_limit: i64,
    ) -> RequestContext {
        let (scenes, messages, image_summary) = tokio::join!(
            SceneRepo::list_by_project(pool, project_id),
            MessageRepo::list_recent(pool, project_id, message_limit),
            summarize_images(backend, image_refs),
        );

        let scenes = scenes.unwrap_or_else(|e| {
            tracing::warn!(error = %e, project_id, "Scene fetch failed, building context without scenes");
            Vec::new()
        });
        let recent_messages = messages.unwrap_or_else(|e| {
            tracing::warn!(error = %e, project_id, "Message fetch failed, building context without history");
            Vec::new()
        });

        let scene_refs = scenes
            .iter()
            .map(|s| SceneRef {
                id: s.id,
                position: s.position,
                duration_frames: s.duration_frames,
                created_at: s.created_at,
                updated_at: s.updated_at,
            })
            .collect();

        let scene_digests = scenes
            .iter()
            .map(|s| SceneDigest {
                id: s.id,
                position: s.position,
                duration_frames: s.duration_frames,
                content_fingerprint: fingerprint(&s.content),
            })
            .collect();

        let last_scene_content = scenes
            .iter()
            .max_by_key(|s| s.position)
            .map(|s| s.content.clone());

        RequestContext {
            scene_refs,
            scene_digests,
            last_scene_content,
            recent_messages,
            image_summary,
        }
    }
}

fn fingerprint(content: &str) -> String {
    let flat: String = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= FINGERPRINT_CHARS {
        flat
    } else {
        let truncated: String = flat.chars().take(FINGERPRINT_CHARS).collect();
        format!("{truncated}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_flattens_whitespace() {
        assert_eq!(fingerprint("<Title>\n  Hello\n</Title>"), "<Title> Hello </Title>");
    }

    #[test]
    fn fingerprint_truncates_long_content() {
        let long = "<Body>".to_string() + &"x".repeat(500) + "</Body>";
        let fp = fingerprint(&long);
        assert!(fp.chars().count() <= FINGERPRINT_CHARS + 1);
        assert!(fp.ends_with('…'));
    }
}
