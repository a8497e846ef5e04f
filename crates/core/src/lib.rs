//! Domain types for the sceneforge generation orchestration core.
//!
//! This crate is I/O-free: it holds the error taxonomy, the [`Decision`]
//! value object produced by the decision engine, and the structural
//! validation rules for scene component markup. Everything here is pure
//! and unit-testable without a database or a generation backend.
//!
//! [`Decision`]: decision::Decision

pub mod content;
pub mod decision;
pub mod error;
pub mod types;
