//! The Edit tool and its three strategies.
//!
//! - surgical: minimal diff; elements the prompt does not name must
//!   survive byte-identical, and when the prompt names no element at all
//!   no element may be dropped;
//! - creative: holistic regeneration, duration may change;
//! - error-fix: remove a reported failure without collateral changes.
//!
//! Validation per strategy is structural; on a violation the backend gets
//! one retry with the violation spelled out, then the edit fails as a
//! generation error.

use sceneforge_core::content::{
    contains_error_signature, structural_similarity, surgical_preservation_violations,
    validate_markup,
};
use sceneforge_core::decision::EditClass;
use sceneforge_core::error::CoreError;
use sceneforge_genai::vision::ImageSummary;
use sceneforge_genai::{ChatMessage, CompletionBackend};

use super::{parse_payload, to_core, GenPayload};

/// Minimum top-level structural similarity an error-fix must preserve.
const ERROR_FIX_MIN_SIMILARITY: f64 = 0.9;

const SURGICAL_INSTRUCTION: &str = "You make minimal, targeted edits to component markup. \
Change ONLY what the request names; every other element must be reproduced byte-for-byte. \
Reply with only a JSON object: {\"content\": full revised markup, \"changesApplied\": \
[short descriptions], \"rationale\": string, \"userFacingMessage\": string}.";

const CREATIVE_INSTRUCTION: &str = "You restyle scenes of a component-based video project. \
Regenerate the scene holistically to match the requested style, keeping its intent. Reply \
with only a JSON object: {\"content\": full revised markup, \"durationFrames\": number|null, \
\"changesApplied\": [short descriptions], \"rationale\": string, \"userFacingMessage\": string}.";

const ERROR_FIX_INSTRUCTION: &str = "You fix broken component markup. Resolve exactly the \
reported error while preserving the scene's intent and structure; introduce no unrelated \
changes. Reply with only a JSON object: {\"content\": full corrected markup, \
\"changesApplied\": [short descriptions], \"rationale\": string, \"userFacingMessage\": string}.";

/// Input to the Edit tool.
#[derive(Debug)]
pub struct EditInput<'a> {
    pub prompt: &'a str,
    pub current_content: &'a str,
    pub current_duration: i32,
    pub edit_class: EditClass,
    pub image_summary: Option<&'a ImageSummary>,
    pub style_hints: &'a [String],
    /// Structured failure description; required for [`EditClass::ErrorFix`].
    pub error_details: Option<&'a str>,
}

/// Successful Edit result. `changes_applied` is never empty.
#[derive(Debug)]
pub struct EditOutput {
    pub content: String,
    pub duration_frames: i32,
    pub changes_applied: Vec<String>,
    pub rationale: String,
    pub user_facing_message: String,
}

/// Run one edit. One generation call plus one retry with the structural
/// violation as a correction hint.
pub async fn run(
    backend: &dyn CompletionBackend,
    input: EditInput<'_>,
) -> Result<EditOutput, CoreError> {
    if input.edit_class == EditClass::ErrorFix && input.error_details.is_none() {
        return Err(CoreError::Validation(
            "An error-fix edit requires error details".to_string(),
        ));
    }

    let instruction = match input.edit_class {
        EditClass::Surgical => SURGICAL_INSTRUCTION,
        EditClass::Creative => CREATIVE_INSTRUCTION,
        EditClass::ErrorFix => ERROR_FIX_INSTRUCTION,
    };
    let mut messages = vec![
        ChatMessage::system(instruction),
        ChatMessage::user(describe(&input)),
    ];

    for attempt in 0..2 {
        let raw = backend.complete(&messages).await.map_err(to_core)?;

        let failure = match parse_payload(&raw) {
            Ok(payload) => match validate(&input, &payload) {
                Ok(()) => return Ok(finish(&input, payload)),
                Err(violation) => violation,
            },
            Err(parse_err) => parse_err.to_string(),
        };

        if attempt == 0 {
            tracing::warn!(edit_class = ?input.edit_class, failure = %failure, "Edit output invalid, retrying with correction hint");
            messages.push(ChatMessage::assistant(raw));
            messages.push(ChatMessage::user(format!(
                "{failure}. Regenerate the full JSON object, correcting this."
            )));
        } else {
            return Err(CoreError::generation(format!(
                "Edit tool failed after retry: {failure}"
            )));
        }
    }
    unreachable!("loop returns on the second attempt")
}

/// Strategy-specific structural validation.
fn validate(input: &EditInput<'_>, payload: &GenPayload) -> Result<(), String> {
    if let Err(e) = validate_markup(&payload.content) {
        return Err(format!("The revised content does not parse: {e}"));
    }

    match input.edit_class {
        EditClass::Surgical => {
            let violations = surgical_preservation_violations(
                input.current_content,
                &payload.content,
                input.prompt,
            );
            if !violations.is_empty() {
                return Err(format!(
                    "These elements were not referenced by the request but were altered or \
                     dropped: {}. Reproduce them byte-for-byte",
                    violations.join(", ")
                ));
            }
        }
        EditClass::Creative => {}
        EditClass::ErrorFix => {
            let details = input.error_details.unwrap_or_default();
            if contains_error_signature(&payload.content, details) {
                return Err("The reported error signature is still present".to_string());
            }
            let similarity = structural_similarity(input.current_content, &payload.content);
            if similarity < ERROR_FIX_MIN_SIMILARITY {
                return Err(format!(
                    "The fix changed the scene structure too much (similarity {similarity:.2}); \
                     keep the same top-level elements"
                ));
            }
        }
    }
    Ok(())
}

fn finish(input: &EditInput<'_>, payload: GenPayload) -> EditOutput {
    // Only creative edits may change duration.
    let duration_frames = match input.edit_class {
        EditClass::Creative => payload
            .duration_frames
            .filter(|d| *d > 0)
            .unwrap_or(input.current_duration),
        EditClass::Surgical | EditClass::ErrorFix => input.current_duration,
    };

    let changes_applied = if payload.changes_applied.is_empty() {
        vec!["Revised scene content".to_string()]
    } else {
        payload.changes_applied
    };

    EditOutput {
        content: payload.content,
        duration_frames,
        changes_applied,
        rationale: payload.rationale.unwrap_or_default(),
        user_facing_message: payload
            .user_facing_message
            .unwrap_or_else(|| "Updated the scene.".to_string()),
    }
}

fn describe(input: &EditInput<'_>) -> String {
    let mut out = String::new();

    out.push_str(&format!("Request: {}\n", input.prompt));

    if let Some(details) = input.error_details {
        out.push_str(&format!("Reported error:\n{details}\n"));
    }
    if let Some(summary) = input.image_summary {
        out.push_str(&format!(
            "Match these reference images: colors {:?}, elements {:?}, style {:?}\n",
            summary.dominant_colors, summary.detected_elements, summary.style_adjectives
        ));
    }
    if !input.style_hints.is_empty() {
        out.push_str(&format!("Style hints: {}\n", input.style_hints.join("; ")));
    }

    out.push_str(&format!(
        "Current scene content ({} frames):\n{}\n",
        input.current_duration, input.current_content
    ));
    out
}
