//! The generation orchestration pipeline.
//!
//! One request flows
//! `context → decision → tool → commit → background events → envelope`:
//!
//! - [`context::ContextBuilder`] aggregates read-only project state,
//!   best-effort and concurrently;
//! - [`decide::DecisionEngine`] turns the prompt plus context into one
//!   validated [`Decision`](sceneforge_core::decision::Decision);
//! - [`tools`] hold the pure content generators (Add, Edit, Delete
//!   validation), with no storage access, only the completion backend;
//! - [`orchestrator::Orchestrator`] is the single writer: it sequences
//!   the steps, owns optimistic-concurrency retries, commits, publishes
//!   events, and builds the canonical [`envelope::ResponseEnvelope`].

pub mod context;
pub mod decide;
pub mod envelope;
pub mod orchestrator;
pub mod tools;

pub use orchestrator::{GenerateRequest, Orchestrator, OrchestratorConfig};
