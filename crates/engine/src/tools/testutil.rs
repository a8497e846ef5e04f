//! Scripted completion backend for tool and engine tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use sceneforge_genai::{BackendError, ChatMessage, CompletionBackend};

/// Replays a fixed sequence of responses and records every call.
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedBackend {
    /// A backend that answers with the given texts, in order.
    pub fn replying<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(|s| Ok(s.into())).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A backend whose every call fails with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            responses: Mutex::new(VecDeque::from([Err(message.clone()), Err(message)])),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Number of completed calls so far.
    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// The message list of the most recent call.
    pub fn last_call(&self) -> Vec<ChatMessage> {
        self.calls.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, BackendError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(msg)) => Err(BackendError::Http(msg)),
            None => Err(BackendError::Http("script exhausted".to_string())),
        }
    }
}
