//! LLM backend abstraction.
//!
//! The planner and searcher depend on a single `complete(prompt) -> text`
//! style call; this module defines the trait plus a scripted mock for tests
//! and an OpenAI-compatible client. The core is agnostic to the backend's
//! transport.

mod mock;
mod openai;

pub use mock::MockLlm;
pub use openai::ChatOpenAI;

use async_trait::async_trait;

use crate::error::SessionError;
use crate::message::Message;

/// LLM client: given prompt messages, returns the assistant text.
///
/// The protocol adapter builds the message list; callers parse the returned
/// text into structured actions. Implementations: `MockLlm` (scripted),
/// `ChatOpenAI` (OpenAI-compatible Chat Completions).
///
/// **Interaction**: Held behind `Arc<dyn LlmClient>` in the backend registry
/// and shared by the planner and searcher of every session.
#[async_trait]
pub trait LlmClient: Send + Sync + std::fmt::Debug {
    async fn invoke(&self, messages: &[Message]) -> Result<String, SessionError>;
}
