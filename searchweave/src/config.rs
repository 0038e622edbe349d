//! Session configuration and environment-based credentials.
//!
//! Limits and locale are explicit values with builder setters; credentials
//! come from the environment (a `.env` file is honored via `dotenv`). A
//! missing credential is a hard `Configuration` error raised before any turn
//! starts; there is no placeholder default.

use crate::error::SessionError;
use crate::protocol::Locale;

/// Environment variable holding the search API key.
pub const SEARCH_API_KEY_VAR: &str = "SEARCH_API_KEY";

const DEFAULT_MAX_TURN: usize = 10;
const DEFAULT_TOP_K: usize = 6;

/// Per-session limits and prompt locale.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Prompt template locale.
    pub locale: Locale,
    /// Upper bound on planner invocations per session.
    pub max_turn: usize,
    /// Hits requested per search query.
    pub top_k: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            max_turn: DEFAULT_MAX_TURN,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the prompt locale (builder).
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Set the planner turn budget (builder). Must be at least 1.
    pub fn with_max_turn(mut self, max_turn: usize) -> Self {
        self.max_turn = max_turn;
        self
    }

    /// Set hits per search query (builder).
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Validates limits before a session is built.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.max_turn == 0 {
            return Err(SessionError::Configuration(
                "max_turn must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reads the search API key from the environment (after loading `.env`).
///
/// A missing or empty key is a hard `Configuration` error: surfacing it
/// before the first turn beats discovering degraded tool calls mid-session.
pub fn search_api_key_from_env() -> Result<String, SessionError> {
    dotenv::dotenv().ok();
    match std::env::var(SEARCH_API_KEY_VAR) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(SessionError::Configuration(format!(
            "{} is not set; export it or add it to .env",
            SEARCH_API_KEY_VAR
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: defaults match the original consumer (max_turn 10, top_k 6).
    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.max_turn, 10);
        assert_eq!(config.top_k, 6);
        assert_eq!(config.locale, Locale::En);
        assert!(config.validate().is_ok());
    }

    /// **Scenario**: builder setters stick and zero max_turn is rejected.
    #[test]
    fn builder_and_validation() {
        let config = SessionConfig::new()
            .with_locale(Locale::Cn)
            .with_max_turn(3)
            .with_top_k(2);
        assert_eq!(config.locale, Locale::Cn);
        assert_eq!(config.max_turn, 3);
        assert_eq!(config.top_k, 2);

        let bad = SessionConfig::new().with_max_turn(0);
        assert!(matches!(
            bad.validate(),
            Err(SessionError::Configuration(_))
        ));
    }
}
