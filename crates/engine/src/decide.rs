//! The decision step: one model call, parsed and validated into a
//! [`Decision`].
//!
//! Stateless given its inputs. A malformed model response is retried once
//! with a stricter instruction, then surfaced as a generation error; it
//! is never silently defaulted to a destructive operation.

use sceneforge_core::decision::{
    parse_raw_decision, resolve_target, Decision, TargetStrategy,
};
use sceneforge_core::error::CoreError;
use sceneforge_core::types::DbId;
use sceneforge_genai::{BackendError, ChatMessage, CompletionBackend};

use crate::context::RequestContext;

const DECISION_INSTRUCTION: &str = "You are the operation planner for a scene-based video \
project. Choose exactly one tool for the user's request and reply with only a JSON object:\n\
{\"tool\": \"add\"|\"edit\"|\"delete\", \"targetSceneId\": number|null, \
\"editClass\": \"surgical\"|\"creative\"|\"error-fix\"|null, \"confidence\": 0..1, \
\"styleHints\": [..], \"errorDetails\": string|null, \"confirmed\": bool, \
\"rationale\": string, \"userFacingMessage\": string}\n\
Rules: small localized changes are surgical edits; broad restyling or matching reference \
images is a creative edit; a request quoting a failure trace is an error-fix edit (put the \
trace in errorDetails); choose delete only when the user clearly asks for removal, and set \
confirmed=true only when they explicitly confirm it.";

const STRICT_RETRY_INSTRUCTION: &str = "Your previous reply was not parseable. Reply with \
ONLY the JSON object described earlier. No prose, no code fences.";

/// Maps (prompt, context) to a single validated [`Decision`].
pub struct DecisionEngine<'a> {
    backend: &'a dyn CompletionBackend,
    strategy: TargetStrategy,
}

impl<'a> DecisionEngine<'a> {
    pub fn new(backend: &'a dyn CompletionBackend, strategy: TargetStrategy) -> Self {
        Self { backend, strategy }
    }

    /// Run the decision call and apply the validation rules.
    ///
    /// `target_override` is the request's explicit target, which wins over
    /// the model's choice for Edit and Delete.
    pub async fn decide(
        &self,
        prompt: &str,
        ctx: &RequestContext,
        target_override: Option<DbId>,
    ) -> Result<Decision, CoreError> {
        let mut messages = vec![
            ChatMessage::system(DECISION_INSTRUCTION),
            ChatMessage::user(self.describe(prompt, ctx)),
        ];

        let raw = self.backend.complete(&messages).await.map_err(to_core)?;
        let decision = match parse_raw_decision(&raw) {
            Ok(decision) => decision,
            Err(first_err) => {
                tracing::warn!(error = %first_err, "Decision response unparseable, retrying stricter");
                messages.push(ChatMessage::assistant(raw));
                messages.push(ChatMessage::user(STRICT_RETRY_INSTRUCTION));
                let raw = self.backend.complete(&messages).await.map_err(to_core)?;
                parse_raw_decision(&raw)?
            }
        };

        tracing::debug!(
            tool = ?decision.tool,
            target = decision.target_scene_id,
            edit_class = ?decision.edit_class,
            confidence = decision.confidence,
            fallback = decision.is_fallback,
            "Decision parsed"
        );

        resolve_target(decision, &ctx.scene_refs, target_override, self.strategy)
    }

    /// Render the context into the user turn of the decision prompt.
    fn describe(&self, prompt: &str, ctx: &RequestContext) -> String {
        let mut out = String::new();

        if ctx.scene_digests.is_empty() {
            out.push_str("The project has no scenes yet.\n");
        } else {
            out.push_str("Current scenes, in order:\n");
            for d in &ctx.scene_digests {
                out.push_str(&format!(
                    "- scene {} (position {}, {} frames): {}\n",
                    d.id, d.position, d.duration_frames, d.content_fingerprint
                ));
            }
        }

        if !ctx.recent_messages.is_empty() {
            out.push_str("\nRecent conversation:\n");
            for m in &ctx.recent_messages {
                out.push_str(&format!("[{}] {}\n", m.role, m.text));
            }
        }

        if let Some(summary) = &ctx.image_summary {
            out.push_str(&format!(
                "\nReference image summary: colors {:?}, elements {:?}, style {:?}\n",
                summary.dominant_colors, summary.detected_elements, summary.style_adjectives
            ));
        }

        out.push_str(&format!("\nUser request: {prompt}\n"));
        out
    }
}

fn to_core(err: BackendError) -> CoreError {
    CoreError::generation(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use sceneforge_core::decision::ToolName;

    use crate::tools::testutil::ScriptedBackend;

    #[tokio::test]
    async fn parses_first_response_when_valid() {
        let backend = ScriptedBackend::replying([r#"{"tool": "add", "confidence": 0.9}"#]);
        let engine = DecisionEngine::new(&backend, TargetStrategy::default());
        let d = engine
            .decide("add an intro", &RequestContext::default(), None)
            .await
            .unwrap();
        assert_eq!(d.tool, ToolName::Add);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn retries_once_with_stricter_instruction() {
        let backend =
            ScriptedBackend::replying(["total nonsense", r#"{"tool": "add"}"#]);
        let engine = DecisionEngine::new(&backend, TargetStrategy::default());
        let d = engine
            .decide("add an intro", &RequestContext::default(), None)
            .await
            .unwrap();
        assert_eq!(d.tool, ToolName::Add);
        assert_eq!(backend.calls(), 2);
        // The retry turn carries the stricter instruction.
        let last = backend.last_call();
        assert!(last.last().unwrap().content.contains("ONLY the JSON object"));
    }

    #[tokio::test]
    async fn two_unparseable_responses_surface_generation_error() {
        let backend = ScriptedBackend::replying(["garbage", "more garbage"]);
        let engine = DecisionEngine::new(&backend, TargetStrategy::default());
        let err = engine
            .decide("do something", &RequestContext::default(), None)
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Generation { retryable: true, .. });
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn edit_with_empty_project_is_coerced_to_add() {
        let backend = ScriptedBackend::replying([r#"{"tool": "edit"}"#]);
        let engine = DecisionEngine::new(&backend, TargetStrategy::default());
        let d = engine
            .decide("tweak the colors", &RequestContext::default(), None)
            .await
            .unwrap();
        assert_eq!(d.tool, ToolName::Add);
    }

    #[tokio::test]
    async fn unknown_tool_becomes_clarify_fallback_not_error() {
        let backend = ScriptedBackend::replying([r#"{"tool": "merge"}"#]);
        let engine = DecisionEngine::new(&backend, TargetStrategy::default());
        let d = engine
            .decide("merge scenes", &RequestContext::default(), None)
            .await
            .unwrap();
        assert!(d.is_fallback);
        assert_eq!(d.tool, ToolName::Edit);
    }
}
