//! Minimal message types for LLM prompts.
//!
//! Message roles: System (usually first in the list), User, Assistant.
//! Used by the protocol adapter when formatting planner/searcher prompts
//! and by `LlmClient::invoke`.

/// A single message in a prompt.
///
/// Roles: system prompt, user input, assistant reply. No separate Tool role;
/// tool output is folded into the user message by the protocol adapter.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Message {
    /// System prompt; typically placed first in the message list.
    System(String),
    /// User input.
    User(String),
    /// Model reply (e.g. few-shot examples or retry context).
    Assistant(String),
}

impl Message {
    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(content.into())
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant(content.into())
    }

    /// Returns the text content regardless of role.
    pub fn content(&self) -> &str {
        match self {
            Self::System(s) | Self::User(s) | Self::Assistant(s) => s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: system/user/assistant constructors produce the correct variant with content.
    #[test]
    fn message_constructors() {
        let sys = Message::system("s");
        assert!(matches!(&sys, Message::System(c) if c == "s"));
        let usr = Message::user("u");
        assert!(matches!(&usr, Message::User(c) if c == "u"));
        let ast = Message::assistant("a");
        assert!(matches!(&ast, Message::Assistant(c) if c == "a"));
    }

    /// **Scenario**: content() returns the inner text for every variant.
    #[test]
    fn message_content_accessor() {
        assert_eq!(Message::system("s").content(), "s");
        assert_eq!(Message::user("u").content(), "u");
        assert_eq!(Message::assistant("a").content(), "a");
    }
}
