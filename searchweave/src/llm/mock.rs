//! Mock LLM for tests and credential-free runs.
//!
//! Replies come from a scripted queue; when the queue is empty an optional
//! repeating fallback answers every further call. Malformed-output scenarios
//! are just scripted non-JSON strings.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::SessionError;
use crate::llm::LlmClient;
use crate::message::Message;

/// Mock LLM: scripted replies, then an optional repeating fallback.
///
/// Thread-safe; one instance can serve the planner and searcher of a session.
///
/// **Interaction**: Implements `LlmClient`; used by unit tests, the
/// integration scenarios, and the CLI `--mock` mode.
#[derive(Debug)]
pub struct MockLlm {
    replies: Mutex<VecDeque<String>>,
    fallback: Option<String>,
}

impl MockLlm {
    /// Creates a mock that pops one scripted reply per call.
    ///
    /// Calls beyond the script fail with `SessionError::Llm`, which makes
    /// over-consumption visible in tests.
    pub fn scripted<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            fallback: None,
        }
    }

    /// Creates a mock that returns the same reply for every call.
    pub fn repeating(reply: impl Into<String>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Some(reply.into()),
        }
    }

    /// Sets a repeating fallback used once the script is exhausted (builder).
    pub fn with_fallback(mut self, reply: impl Into<String>) -> Self {
        self.fallback = Some(reply.into());
        self
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, _messages: &[Message]) -> Result<String, SessionError> {
        let scripted = self.replies.lock().expect("mock lock").pop_front();
        match scripted.or_else(|| self.fallback.clone()) {
            Some(reply) => Ok(reply),
            None => Err(SessionError::Llm("mock script exhausted".to_string())),
        }
    }
}
