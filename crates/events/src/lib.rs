//! Post-commit side effects, decoupled from the request path.
//!
//! The orchestrator publishes a [`DomainEvent`] to the [`EventBus`] after
//! each successful commit; the [`BackgroundDispatcher`] consumes them on
//! its own task and owns its own error handling. A failing side effect
//! never changes a user-facing response.

pub mod bus;
pub mod dispatcher;

pub use bus::{DomainEvent, EventBus};
pub use dispatcher::BackgroundDispatcher;
