//! The [`Decision`] value object and the rules that make a raw model
//! response trustworthy.
//!
//! The decision engine (in `sceneforge-engine`) performs the actual model
//! call; everything that can be checked without I/O lives here so the
//! rules are testable in isolation: parsing the raw JSON, the clarify
//! fallback for unknown tool names, and target resolution policy.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Tool and edit-class enums
// ---------------------------------------------------------------------------

/// The closed set of operations the decision engine may select.
///
/// Deliberately an enum rather than a string so dispatch is exhaustive at
/// compile time; an unrecognized name from the model never becomes a
/// variant (see [`parse_raw_decision`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolName {
    Add,
    Edit,
    Delete,
}

/// Sub-strategy for the Edit tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditClass {
    /// Minimal, targeted change. Unreferenced content must survive intact.
    Surgical,
    /// Holistic regeneration guided by style hints or reference images.
    Creative,
    /// Correct a reported failure while preserving intent.
    ErrorFix,
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Structured output of the decision engine.
///
/// Ephemeral: produced fresh per request, never persisted. The
/// orchestrator uses it to pick and parameterize exactly one tool run.
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    pub tool: ToolName,
    pub target_scene_id: Option<DbId>,
    pub edit_class: Option<EditClass>,
    /// Model self-reported confidence, clamped to `[0, 1]`. Reported to
    /// the caller, never used to block execution.
    pub confidence: f64,
    pub style_hints: Vec<String>,
    /// Failure trace the model extracted from the prompt, present when
    /// `edit_class` is [`EditClass::ErrorFix`].
    pub error_details: Option<String>,
    pub rationale: String,
    pub user_facing_message: String,
    /// For Delete decisions: whether the user explicitly confirmed the
    /// removal. The delete tool rejects unconfirmed intents.
    pub confirmed: bool,
    /// Set when this decision is the clarify fallback rather than a
    /// parsed model choice. The orchestrator answers with a clarification
    /// instead of running a tool.
    pub is_fallback: bool,
}

/// Wire shape of the model's decision JSON. Kept separate from
/// [`Decision`] so unknown tool names can be handled without failing
/// deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDecision {
    tool: String,
    #[serde(default)]
    target_scene_id: Option<DbId>,
    #[serde(default)]
    edit_class: Option<EditClass>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    style_hints: Vec<String>,
    #[serde(default)]
    error_details: Option<String>,
    #[serde(default)]
    confirmed: bool,
    #[serde(default)]
    rationale: Option<String>,
    #[serde(default)]
    user_facing_message: Option<String>,
}

/// The defined fallback for an unrecognized tool name: an error-fix Edit
/// that asks the user to clarify instead of guessing. Never Delete.
pub fn clarify_fallback(unknown_tool: &str) -> Decision {
    Decision {
        tool: ToolName::Edit,
        target_scene_id: None,
        edit_class: Some(EditClass::ErrorFix),
        confidence: 0.0,
        style_hints: Vec::new(),
        error_details: None,
        rationale: format!("Model selected unknown tool '{unknown_tool}'"),
        confirmed: false,
        user_facing_message: "I wasn't sure what change you wanted. Could you rephrase \
            your request, naming the scene you'd like to add, edit, or delete?"
            .to_string(),
        is_fallback: true,
    }
}

/// Parse the model's raw decision JSON into a [`Decision`].
///
/// - Malformed JSON is a [`CoreError::Generation`] so the engine can retry
///   once with a stricter instruction.
/// - An unknown `tool` value maps to [`clarify_fallback`], never an error
///   and never a destructive default.
/// - Confidence is clamped to `[0, 1]`; a missing confidence reads as 0.5.
pub fn parse_raw_decision(raw: &str) -> Result<Decision, CoreError> {
    let raw: RawDecision = serde_json::from_str(extract_json_object(raw)).map_err(|e| {
        CoreError::generation(format!("Decision response was not valid JSON: {e}"))
    })?;

    let tool = match raw.tool.to_ascii_lowercase().as_str() {
        "add" => ToolName::Add,
        "edit" => ToolName::Edit,
        "delete" => ToolName::Delete,
        unknown => return Ok(clarify_fallback(unknown)),
    };

    Ok(Decision {
        tool,
        target_scene_id: raw.target_scene_id,
        edit_class: raw.edit_class,
        confidence: raw.confidence.unwrap_or(0.5).clamp(0.0, 1.0),
        style_hints: raw.style_hints,
        error_details: raw.error_details,
        rationale: raw.rationale.unwrap_or_default(),
        user_facing_message: raw.user_facing_message.unwrap_or_default(),
        confirmed: raw.confirmed,
        is_fallback: false,
    })
}

/// Trim a model response down to the outermost JSON object.
///
/// Models occasionally wrap their JSON in prose or code fences; taking the
/// first `{` through the last `}` recovers the object without a reparse.
fn extract_json_object(raw: &str) -> &str {
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if end > start => &raw[start..=end],
        _ => raw,
    }
}

// ---------------------------------------------------------------------------
// Target resolution
// ---------------------------------------------------------------------------

/// Policy knob for resolving an Edit decision that names no target scene.
///
/// The "most recent" default is a UX heuristic, so it is configurable
/// rather than hard-wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetStrategy {
    /// Fall back to the most recently created scene.
    #[default]
    MostRecentCreated,
    /// Fall back to the most recently updated scene.
    MostRecentUpdated,
    /// Refuse to guess; ask the user to name a scene.
    Reject,
}

impl std::str::FromStr for TargetStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "most_recent_created" => Ok(TargetStrategy::MostRecentCreated),
            "most_recent_updated" => Ok(TargetStrategy::MostRecentUpdated),
            "reject" => Ok(TargetStrategy::Reject),
            other => Err(format!("unknown target strategy '{other}'")),
        }
    }
}

/// Minimal scene listing used for target resolution and context digests.
#[derive(Debug, Clone, Serialize)]
pub struct SceneRef {
    pub id: DbId,
    pub position: i32,
    pub duration_frames: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Apply the target-resolution rules to a freshly parsed decision.
///
/// - An explicit `target_override` from the request wins over whatever the
///   model picked, for Edit and Delete.
/// - Edit with no target: zero scenes coerces the decision to Add;
///   otherwise the configured [`TargetStrategy`] applies.
/// - Delete always requires a resolvable target; with zero scenes or a
///   `Reject`-style miss this is a validation error, never a guess.
/// - A named target that is not in `scenes` is a not-found error (the
///   scene list is the authoritative view of the project).
pub fn resolve_target(
    mut decision: Decision,
    scenes: &[SceneRef],
    target_override: Option<DbId>,
    strategy: TargetStrategy,
) -> Result<Decision, CoreError> {
    if decision.is_fallback {
        return Ok(decision);
    }

    if let Some(id) = target_override {
        if decision.tool != ToolName::Add {
            decision.target_scene_id = Some(id);
        }
    }

    match decision.tool {
        ToolName::Add => {
            decision.target_scene_id = None;
            Ok(decision)
        }
        ToolName::Edit => {
            match decision.target_scene_id {
                Some(id) => {
                    ensure_target_exists(id, scenes)?;
                    Ok(decision)
                }
                None if scenes.is_empty() => {
                    // Nothing to edit: the only sensible reading is "create one".
                    decision.tool = ToolName::Add;
                    decision.edit_class = None;
                    Ok(decision)
                }
                None => {
                    decision.target_scene_id = Some(default_target(scenes, strategy)?);
                    Ok(decision)
                }
            }
        }
        ToolName::Delete => match decision.target_scene_id {
            Some(id) => {
                ensure_target_exists(id, scenes)?;
                Ok(decision)
            }
            None => Err(CoreError::Validation(
                "Delete requires an explicit target scene".to_string(),
            )),
        },
    }
}

fn ensure_target_exists(id: DbId, scenes: &[SceneRef]) -> Result<(), CoreError> {
    if scenes.iter().any(|s| s.id == id) {
        Ok(())
    } else {
        Err(CoreError::NotFound {
            entity: "Scene",
            id,
        })
    }
}

fn default_target(scenes: &[SceneRef], strategy: TargetStrategy) -> Result<DbId, CoreError> {
    match strategy {
        TargetStrategy::MostRecentCreated => Ok(scenes
            .iter()
            .max_by_key(|s| (s.created_at, s.id))
            .map(|s| s.id)
            .expect("caller verified scenes is non-empty")),
        TargetStrategy::MostRecentUpdated => Ok(scenes
            .iter()
            .max_by_key(|s| (s.updated_at, s.id))
            .map(|s| s.id)
            .expect("caller verified scenes is non-empty")),
        TargetStrategy::Reject => Err(CoreError::Validation(
            "Please say which scene you'd like to edit".to_string(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
