//! Generation-backend client.
//!
//! [`GenAiClient`] speaks the OpenAI-compatible `/chat/completions`
//! protocol over HTTPS, which covers the vast majority of hosted and
//! self-hosted completion services. The [`CompletionBackend`] trait is the
//! seam that keeps the decision engine and the content tools pure and
//! testable: production injects the client, tests inject scripted fakes.

pub mod backend;
pub mod client;
pub mod vision;

pub use backend::{BackendError, ChatMessage, ChatRole, CompletionBackend};
pub use client::GenAiClient;
pub use vision::ImageSummary;
