//! The single-writer pipeline behind a generate request.
//!
//! `handle` never returns `Err`; every outcome, including panic-adjacent
//! backend failures, is folded into a [`ResponseEnvelope`]. The sequence
//! for one request:
//!
//! 1. validate the request and resolve the project;
//! 2. build the read-only context;
//! 3. run the decision engine (appending the user message once a
//!    decision exists, so clarification turns are part of the history);
//! 4. run the chosen tool against the completion backend;
//! 5. commit the mutation (version-checked for edits);
//! 6. append the assistant's summary message (best effort);
//! 7. publish a domain event for background consumers;
//! 8. assemble the envelope.
//!
//! An optimistic-concurrency miss on an edit restarts from step 2 with
//! fresh state, a bounded number of times, then surfaces as a conflict.

use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use sceneforge_core::decision::{Decision, EditClass, TargetStrategy, ToolName};
use sceneforge_core::error::CoreError;
use sceneforge_core::types::DbId;
use sceneforge_db::models::message::NewMessage;
use sceneforge_db::models::scene::{CreateScene, Scene, UpdateSceneContent};
use sceneforge_db::repositories::{MessageRepo, ProjectRepo, SceneRepo};
use sceneforge_db::DbPool;
use sceneforge_events::{DomainEvent, EventBus};
use sceneforge_genai::CompletionBackend;

use crate::context::{ContextBuilder, RequestContext};
use crate::decide::DecisionEngine;
use crate::envelope::{Operation, ResponseContext, ResponseEnvelope};
use crate::tools::add::{self, AddInput};
use crate::tools::delete::{self, DeleteInput};
use crate::tools::edit::{self, EditInput};

/// Extra attempts after a version-token miss before giving up.
const CONFLICT_RETRIES: u32 = 2;

/// Tunables for the pipeline. Defaults match the environment-variable
/// defaults in the api crate.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// How many recent conversation messages enter the decision prompt.
    pub message_limit: i64,
    /// What an Edit without a target resolves to.
    pub target_strategy: TargetStrategy,
    /// Below this confidence the decision is logged as low-confidence.
    /// Reporting only; it never blocks execution.
    pub confidence_floor: f64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            message_limit: 12,
            target_strategy: TargetStrategy::default(),
            confidence_floor: 0.35,
        }
    }
}

/// One natural-language generation request against a project.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub project_id: DbId,
    pub prompt: String,
    pub image_refs: Vec<String>,
    /// Explicit target scene; wins over the model's choice for Edit and
    /// Delete.
    pub target_scene_id: Option<DbId>,
}

/// What a committed request produced, before envelope assembly.
struct Outcome {
    operation: Operation,
    scene: Option<Scene>,
    affected_ids: Vec<DbId>,
    rationale: String,
    user_facing_message: String,
    confidence: f64,
    event: DomainEvent,
}

pub struct Orchestrator {
    pool: DbPool,
    backend: Arc<dyn CompletionBackend>,
    bus: Arc<EventBus>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        pool: DbPool,
        backend: Arc<dyn CompletionBackend>,
        bus: Arc<EventBus>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            pool,
            backend,
            bus,
            config,
        }
    }

    /// Process one request end to end. Always produces an envelope.
    pub async fn handle(&self, request: GenerateRequest) -> ResponseEnvelope {
        let request_id = Uuid::new_v4();
        let started = Instant::now();

        tracing::info!(
            %request_id,
            project_id = request.project_id,
            images = request.image_refs.len(),
            "Generate request accepted"
        );

        match self.execute(&request).await {
            Ok(outcome) => {
                self.record_assistant_message(&request, &outcome.user_facing_message)
                    .await;
                self.touch_project(request.project_id).await;
                self.bus.publish(outcome.event.clone());

                tracing::info!(
                    %request_id,
                    operation = outcome.operation.as_str(),
                    affected = ?outcome.affected_ids,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Generate request committed"
                );

                ResponseEnvelope::success(
                    request_id,
                    started,
                    outcome.operation,
                    outcome.scene,
                    outcome.affected_ids,
                    ResponseContext {
                        rationale: outcome.rationale,
                        user_facing_message: outcome.user_facing_message,
                        confidence: Some(outcome.confidence),
                    },
                )
            }
            Err(err) => {
                tracing::warn!(
                    %request_id,
                    project_id = request.project_id,
                    kind = err.kind(),
                    error = %err,
                    "Generate request failed"
                );
                let message = user_message_for(&err);
                ResponseEnvelope::failure(request_id, started, None, &err, message)
            }
        }
    }

    async fn execute(&self, request: &GenerateRequest) -> Result<Outcome, CoreError> {
        if request.prompt.trim().is_empty() {
            return Err(CoreError::Validation(
                "The request text is empty".to_string(),
            ));
        }

        let project = ProjectRepo::find_by_id(&self.pool, request.project_id)
            .await
            .map_err(persistence)?;
        if project.is_none() {
            return Err(CoreError::NotFound {
                entity: "Project",
                id: request.project_id,
            });
        }

        let mut user_message_recorded = false;

        for attempt in 0..=CONFLICT_RETRIES {
            let ctx = ContextBuilder::build(
                &self.pool,
                self.backend.as_ref(),
                request.project_id,
                &request.image_refs,
                self.config.message_limit,
            )
            .await;

            let decision = DecisionEngine::new(self.backend.as_ref(), self.config.target_strategy)
                .decide(&request.prompt, &ctx, request.target_scene_id)
                .await?;

            // The user turn enters the history exactly once, and only
            // after a decision exists, so a request the backend never
            // understood leaves no half-recorded conversation.
            if !user_message_recorded {
                MessageRepo::append(
                    &self.pool,
                    &NewMessage::user(
                        request.project_id,
                        request.prompt.clone(),
                        request.image_refs.clone(),
                    ),
                )
                .await
                .map_err(persistence)?;
                user_message_recorded = true;
            }

            if decision.is_fallback {
                self.record_assistant_message(request, &decision.user_facing_message)
                    .await;
                return Err(CoreError::Validation(decision.user_facing_message));
            }

            if decision.confidence < self.config.confidence_floor {
                tracing::warn!(
                    project_id = request.project_id,
                    confidence = decision.confidence,
                    tool = ?decision.tool,
                    "Low-confidence decision, proceeding"
                );
            }

            match decision.tool {
                ToolName::Add => return self.run_add(request, &ctx, decision).await,
                ToolName::Delete => return self.run_delete(request, decision).await,
                ToolName::Edit => match self.run_edit(request, &ctx, decision).await? {
                    EditAttempt::Committed(outcome) => return Ok(outcome),
                    EditAttempt::VersionMiss => {
                        tracing::info!(
                            project_id = request.project_id,
                            attempt,
                            "Scene changed under the edit, re-deciding with fresh state"
                        );
                    }
                },
            }
        }

        Err(CoreError::Conflict(
            "The scene kept changing while the edit was being prepared".to_string(),
        ))
    }

    async fn run_add(
        &self,
        request: &GenerateRequest,
        ctx: &RequestContext,
        decision: Decision,
    ) -> Result<Outcome, CoreError> {
        let output = add::run(
            self.backend.as_ref(),
            AddInput {
                prompt: &request.prompt,
                project_id: request.project_id,
                prior_scene_content: ctx.last_scene_content.as_deref(),
                image_summary: ctx.image_summary.as_ref(),
                style_hints: &decision.style_hints,
            },
        )
        .await?;

        let scene = SceneRepo::create_at_end(
            &self.pool,
            &CreateScene {
                project_id: request.project_id,
                content: output.content,
                duration_frames: output.duration_frames,
                structured_metadata: output.structured_metadata,
            },
        )
        .await
        .map_err(persistence)?;

        let event = DomainEvent::scene_created(scene.id, scene.project_id, &scene.content);
        Ok(Outcome {
            operation: Operation::SceneCreate,
            affected_ids: vec![scene.id],
            scene: Some(scene),
            rationale: pick_rationale(&decision.rationale, &output.rationale),
            user_facing_message: output.user_facing_message,
            confidence: decision.confidence,
            event,
        })
    }

    async fn run_edit(
        &self,
        request: &GenerateRequest,
        ctx: &RequestContext,
        decision: Decision,
    ) -> Result<EditAttempt, CoreError> {
        let target_id = decision.target_scene_id.ok_or_else(|| {
            CoreError::Validation("The edit did not resolve to a scene".to_string())
        })?;

        let scene = SceneRepo::find_by_id(&self.pool, target_id)
            .await
            .map_err(persistence)?
            .ok_or(CoreError::NotFound {
                entity: "Scene",
                id: target_id,
            })?;

        let edit_class = decision.edit_class.unwrap_or(EditClass::Surgical);
        let error_details = decision
            .error_details
            .as_deref()
            .or(if edit_class == EditClass::ErrorFix {
                // The decision may leave the trace in the prompt itself.
                Some(request.prompt.as_str())
            } else {
                None
            });

        let output = edit::run(
            self.backend.as_ref(),
            EditInput {
                prompt: &request.prompt,
                current_content: &scene.content,
                current_duration: scene.duration_frames,
                edit_class,
                image_summary: ctx.image_summary.as_ref(),
                style_hints: &decision.style_hints,
                error_details,
            },
        )
        .await?;

        let updated = SceneRepo::update_versioned(
            &self.pool,
            scene.id,
            &UpdateSceneContent {
                content: output.content,
                duration_frames: Some(output.duration_frames),
                structured_metadata: None,
                expected_version: scene.version_token,
            },
        )
        .await
        .map_err(persistence)?;

        let Some(updated) = updated else {
            return Ok(EditAttempt::VersionMiss);
        };

        let event = DomainEvent::scene_updated(updated.id, updated.project_id, &updated.content);
        Ok(EditAttempt::Committed(Outcome {
            operation: Operation::SceneUpdate,
            affected_ids: vec![updated.id],
            scene: Some(updated),
            rationale: pick_rationale(&decision.rationale, &output.rationale),
            user_facing_message: summarize_edit(&output.user_facing_message, &output.changes_applied),
            confidence: decision.confidence,
            event,
        }))
    }

    async fn run_delete(
        &self,
        request: &GenerateRequest,
        decision: Decision,
    ) -> Result<Outcome, CoreError> {
        let target_id = decision.target_scene_id.ok_or_else(|| {
            CoreError::Validation("The deletion did not resolve to a scene".to_string())
        })?;

        let intent = delete::validate(DeleteInput {
            scene_id: target_id,
            confirmed: decision.confirmed,
        })?;

        let removed = SceneRepo::delete_and_renumber(&self.pool, intent.scene_id)
            .await
            .map_err(persistence)?
            .ok_or(CoreError::NotFound {
                entity: "Scene",
                id: intent.scene_id,
            })?;

        let event = DomainEvent::scene_deleted(removed.id, removed.project_id);
        Ok(Outcome {
            operation: Operation::SceneDelete,
            affected_ids: vec![removed.id],
            // The row is gone; deletions answer with no scene body.
            scene: None,
            rationale: decision.rationale,
            user_facing_message: intent.user_facing_message,
            confidence: decision.confidence,
            event,
        })
    }

    /// Mark the project as recently changed. Best effort, like the
    /// history write below.
    async fn touch_project(&self, project_id: DbId) {
        if let Err(e) = ProjectRepo::touch(&self.pool, project_id).await {
            tracing::warn!(
                error = %e,
                project_id,
                "Failed to update project timestamp"
            );
        }
    }

    /// Best effort. The mutation is already committed when this runs; a
    /// failing history write is logged, never surfaced.
    async fn record_assistant_message(&self, request: &GenerateRequest, text: &str) {
        if let Err(e) = MessageRepo::append(
            &self.pool,
            &NewMessage::assistant(request.project_id, text),
        )
        .await
        {
            tracing::warn!(
                error = %e,
                project_id = request.project_id,
                "Failed to record assistant message"
            );
        }
    }
}

enum EditAttempt {
    Committed(Outcome),
    VersionMiss,
}

fn persistence(err: sqlx::Error) -> CoreError {
    CoreError::Persistence(err.to_string())
}

fn pick_rationale(decision: &str, tool: &str) -> String {
    if tool.trim().is_empty() {
        decision.to_string()
    } else {
        tool.to_string()
    }
}

fn summarize_edit(message: &str, changes: &[String]) -> String {
    if changes.is_empty() {
        return message.to_string();
    }
    format!("{} ({})", message, changes.join("; "))
}

fn user_message_for(err: &CoreError) -> String {
    match err {
        CoreError::Validation(msg) => msg.clone(),
        CoreError::NotFound { entity, .. } => {
            format!("I couldn't find that {}.", entity.to_lowercase())
        }
        CoreError::Conflict(_) => {
            "The project changed while I was working. Please try again.".to_string()
        }
        CoreError::Generation { .. } => {
            "The generation service had trouble with that request. Please try again.".to_string()
        }
        CoreError::Persistence(_) => {
            "I couldn't save the change. Nothing was modified; please try again.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rationale_prefers_tool_side_when_present() {
        assert_eq!(pick_rationale("decision says", "tool says"), "tool says");
        assert_eq!(pick_rationale("decision says", "  "), "decision says");
    }

    #[test]
    fn edit_summary_appends_changes() {
        let changes = vec!["Recolored title".to_string(), "Slowed fade".to_string()];
        assert_eq!(
            summarize_edit("Updated the scene.", &changes),
            "Updated the scene. (Recolored title; Slowed fade)"
        );
        assert_eq!(summarize_edit("Updated the scene.", &[]), "Updated the scene.");
    }

    #[test]
    fn conflict_maps_to_retry_message() {
        let msg = user_message_for(&CoreError::Conflict("version miss".to_string()));
        assert!(msg.contains("try again"));
    }
}
