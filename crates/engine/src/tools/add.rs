//! The Add tool: generate a brand-new scene.

use sceneforge_core::content::validate_markup;
use sceneforge_core::error::CoreError;
use sceneforge_core::types::DbId;
use sceneforge_genai::vision::ImageSummary;
use sceneforge_genai::{ChatMessage, CompletionBackend};

use super::{parse_payload, to_core};

/// Fallback duration when the backend does not suggest one (~5s at 30fps).
pub const DEFAULT_DURATION_FRAMES: i32 = 150;

const ADD_INSTRUCTION: &str = "You create scenes for a component-based video project. Reply \
with only a JSON object: {\"content\": string of component markup, \"durationFrames\": number, \
\"structuredMetadata\": object|null, \"rationale\": string, \"userFacingMessage\": string}. \
The markup must be well-formed: every <Element> closed, braces balanced.";

/// Input to the Add tool. `project_id` is context only; the tool never
/// touches storage.
#[derive(Debug)]
pub struct AddInput<'a> {
    pub prompt: &'a str,
    pub project_id: DbId,
    /// Content of the current last scene, for visual continuity.
    pub prior_scene_content: Option<&'a str>,
    /// When present, generation is image-driven; the prompt is secondary.
    pub image_summary: Option<&'a ImageSummary>,
    pub style_hints: &'a [String],
}

/// Successful Add result.
#[derive(Debug)]
pub struct AddOutput {
    pub content: String,
    pub duration_frames: i32,
    pub structured_metadata: Option<serde_json::Value>,
    pub rationale: String,
    pub user_facing_message: String,
}

/// Generate a new scene. One generation call, plus one retry with the
/// validation failure appended as a correction hint.
pub async fn run(
    backend: &dyn CompletionBackend,
    input: AddInput<'_>,
) -> Result<AddOutput, CoreError> {
    let mut messages = vec![
        ChatMessage::system(ADD_INSTRUCTION),
        ChatMessage::user(describe(&input)),
    ];

    for attempt in 0..2 {
        let raw = backend.complete(&messages).await.map_err(to_core)?;

        let failure = match parse_payload(&raw) {
            Ok(payload) => match validate_markup(&payload.content) {
                Ok(()) => {
                    return Ok(AddOutput {
                        content: payload.content,
                        duration_frames: payload
                            .duration_frames
                            .filter(|d| *d > 0)
                            .unwrap_or(DEFAULT_DURATION_FRAMES),
                        structured_metadata: payload.structured_metadata,
                        rationale: payload.rationale.unwrap_or_default(),
                        user_facing_message: payload
                            .user_facing_message
                            .unwrap_or_else(|| "Added a new scene.".to_string()),
                    });
                }
                Err(markup_err) => format!("The generated content does not parse: {markup_err}"),
            },
            Err(parse_err) => parse_err.to_string(),
        };

        if attempt == 0 {
            tracing::warn!(project_id = input.project_id, failure = %failure, "Add output invalid, retrying with correction hint");
            messages.push(ChatMessage::assistant(raw));
            messages.push(ChatMessage::user(format!(
                "{failure}. Regenerate the full JSON object with corrected, well-formed markup."
            )));
        } else {
            return Err(CoreError::generation(format!(
                "Add tool failed after retry: {failure}"
            )));
        }
    }
    unreachable!("loop returns on the second attempt")
}

fn describe(input: &AddInput<'_>) -> String {
    let mut out = String::new();

    if let Some(summary) = input.image_summary {
        out.push_str(&format!(
            "Create the scene primarily from these reference images: colors {:?}, \
             elements {:?}, style {:?}. The text below is secondary guidance.\n",
            summary.dominant_colors, summary.detected_elements, summary.style_adjectives
        ));
    }

    out.push_str(&format!("Request: {}\n", input.prompt));

    if !input.style_hints.is_empty() {
        out.push_str(&format!("Style hints: {}\n", input.style_hints.join("; ")));
    }
    if let Some(prior) = input.prior_scene_content {
        out.push_str(&format!(
            "For continuity, the current last scene is:\n{prior}\n"
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    use crate::tools::testutil::ScriptedBackend;

    fn input(prompt: &str) -> AddInput<'_> {
        AddInput {
            prompt,
            project_id: 1,
            prior_scene_content: None,
            image_summary: None,
            style_hints: &[],
        }
    }

    #[tokio::test]
    async fn valid_generation_succeeds_first_try() {
        let backend = ScriptedBackend::replying(
            [r#"{"content": "<Title>Hi</Title>", "durationFrames": 120, "userFacingMessage": "Done"}"#],
        );
        let out = run(&backend, input("an intro title")).await.unwrap();
        assert_eq!(out.content, "<Title>Hi</Title>");
        assert_eq!(out.duration_frames, 120);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn malformed_markup_retries_with_hint_then_succeeds() {
        let backend = ScriptedBackend::replying([
            r#"{"content": "<Title>Hi"}"#,
            r#"{"content": "<Title>Hi</Title>"}"#,
        ]);
        let out = run(&backend, input("an intro title")).await.unwrap();
        assert_eq!(out.content, "<Title>Hi</Title>");
        assert_eq!(backend.calls(), 2);
        // The retry turn carries the parse failure as a hint.
        let last = backend.last_call();
        let hint = &last.last().unwrap().content;
        assert!(hint.contains("does not parse"), "hint was: {hint}");
    }

    #[tokio::test]
    async fn invalid_after_retry_is_generation_error() {
        let backend = ScriptedBackend::replying([
            r#"{"content": "<Title>Hi"}"#,
            r#"{"content": "still <Broken"}"#,
        ]);
        let err = run(&backend, input("an intro title")).await.unwrap_err();
        assert_matches!(err, CoreError::Generation { retryable: true, .. });
    }

    #[tokio::test]
    async fn backend_failure_maps_to_generation_error() {
        let backend = ScriptedBackend::failing("503 from upstream");
        let err = run(&backend, input("an intro title")).await.unwrap_err();
        assert_matches!(err, CoreError::Generation { .. });
    }

    #[tokio::test]
    async fn missing_duration_gets_default() {
        let backend =
            ScriptedBackend::replying([r#"{"content": "<Title>Hi</Title>"}"#]);
        let out = run(&backend, input("an intro title")).await.unwrap();
        assert_eq!(out.duration_frames, DEFAULT_DURATION_FRAMES);
    }

    #[tokio::test]
    async fn image_summary_turns_generation_image_first() {
        let summary = ImageSummary {
            dominant_colors: vec!["#112233".to_string()],
            detected_elements: vec!["logo".to_string()],
            style_adjectives: vec!["minimal".to_string()],
        };
        let backend =
            ScriptedBackend::replying([r#"{"content": "<Logo src=\"x\" />"}"#]);
        let mut inp = input("match this");
        inp.image_summary = Some(&summary);
        run(&backend, inp).await.unwrap();
        let last = backend.last_call();
        let user_turn = &last[1].content;
        assert!(user_turn.contains("primarily from these reference images"));
    }
}
