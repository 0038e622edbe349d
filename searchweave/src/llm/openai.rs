//! OpenAI Chat Completions client implementing `LlmClient`.
//!
//! Uses the OpenAI-compatible Chat Completions API via `async_openai`.
//! Requires `OPENAI_API_KEY` (or explicit config with a custom base URL for
//! self-hosted backends). Text-only: the protocol adapter encodes all
//! structure in the prompt and parses it back from the reply.

use async_trait::async_trait;
use tracing::{debug, trace};

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
    },
    Client,
};

use crate::error::SessionError;
use crate::llm::LlmClient;
use crate::message::Message;

/// OpenAI-compatible Chat Completions client.
///
/// Uses `OPENAI_API_KEY` from the environment by default; or provide config
/// via `ChatOpenAI::with_config` (custom API key or base URL).
///
/// **Interaction**: Implements `LlmClient`; registered in the backend
/// registry under a selector name and shared across sessions.
#[derive(Debug)]
pub struct ChatOpenAI {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
}

impl ChatOpenAI {
    /// Build client with default config (API key from `OPENAI_API_KEY` env).
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
            temperature: None,
        }
    }

    /// Build client with custom config (e.g. custom API key or base URL).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
            temperature: None,
        }
    }

    /// Set temperature (0-2). Lower values are more deterministic.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Convert our `Message` list to OpenAI request messages.
    fn messages_to_request(messages: &[Message]) -> Vec<ChatCompletionRequestMessage> {
        messages
            .iter()
            .map(|m| match m {
                Message::System(s) => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessage::from(s.as_str()),
                ),
                Message::User(s) => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessage::from(s.as_str()),
                ),
                Message::Assistant(s) => {
                    ChatCompletionRequestMessage::Assistant((s.as_str()).into())
                }
            })
            .collect()
    }
}

#[async_trait]
impl LlmClient for ChatOpenAI {
    async fn invoke(&self, messages: &[Message]) -> Result<String, SessionError> {
        let openai_messages = Self::messages_to_request(messages);
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(openai_messages);
        if let Some(t) = self.temperature {
            args.temperature(t);
        }
        let request = args
            .build()
            .map_err(|e| SessionError::Llm(format!("OpenAI request build failed: {}", e)))?;

        debug!(
            model = %self.model,
            message_count = messages.len(),
            temperature = ?self.temperature,
            "OpenAI chat create"
        );
        if let Ok(js) = serde_json::to_string_pretty(&request) {
            trace!(request = %js, "OpenAI request body");
        }

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| SessionError::Llm(format!("OpenAI API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SessionError::Llm("OpenAI returned no choices".to_string()))?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: message conversion preserves order and roles.
    #[test]
    fn messages_to_request_preserves_order() {
        let messages = vec![
            Message::system("sys"),
            Message::user("usr"),
            Message::assistant("ast"),
        ];
        let converted = ChatOpenAI::messages_to_request(&messages);
        assert_eq!(converted.len(), 3);
        assert!(matches!(converted[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(converted[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(
            converted[2],
            ChatCompletionRequestMessage::Assistant(_)
        ));
    }

    /// **Scenario**: builder setters keep the configured model and temperature.
    #[test]
    fn builder_keeps_settings() {
        let client = ChatOpenAI::new("gpt-4o-mini").with_temperature(0.2);
        assert_eq!(client.model, "gpt-4o-mini");
        assert_eq!(client.temperature, Some(0.2));
    }
}
