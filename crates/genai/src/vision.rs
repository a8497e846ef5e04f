//! Best-effort visual analysis of reference images.
//!
//! Context building never fails on a missing image summary, so every
//! error path here collapses to `None` with a warning log.

use serde::{Deserialize, Serialize};

use crate::backend::{ChatMessage, CompletionBackend};

/// Summary of reference images: enough signal to steer generation
/// without shipping pixels around.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSummary {
    // The backend may omit any of these; a partial summary is still useful.
    #[serde(default)]
    pub dominant_colors: Vec<String>,
    #[serde(default)]
    pub detected_elements: Vec<String>,
    #[serde(default)]
    pub style_adjectives: Vec<String>,
}

const SUMMARY_INSTRUCTION: &str = "You are a visual analyst. For the referenced images, reply \
with only a JSON object: {\"dominantColors\": [...], \"detectedElements\": [...], \
\"styleAdjectives\": [...]}. No prose.";

/// Summarize reference images via the completion backend.
///
/// Returns `None` on any backend or parse failure; the caller proceeds
/// with an image-free context.
pub async fn summarize_images(
    backend: &dyn CompletionBackend,
    image_refs: &[String],
) -> Option<ImageSummary> {
    if image_refs.is_empty() {
        return None;
    }

    let messages = [
        ChatMessage::system(SUMMARY_INSTRUCTION),
        ChatMessage::user(format!("Images: {}", image_refs.join(", "))),
    ];

    let raw = match backend.complete(&messages).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = %e, "Image summary request failed, continuing without");
            return None;
        }
    };

    match parse_summary(&raw) {
        Some(summary) => Some(summary),
        None => {
            tracing::warn!("Image summary response was not parseable, continuing without");
            None
        }
    }
}

fn parse_summary(raw: &str) -> Option<ImageSummary> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    serde_json::from_str(&raw[start..=end]).ok()
}
