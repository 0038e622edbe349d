//! Session-level error taxonomy.
//!
//! Fatal conditions end the session: missing configuration (before the first
//! turn), unparseable model output after one retry, turn budget exhaustion,
//! and backend transport failures. Tool failures are deliberately absent here;
//! they degrade to an empty-result `ToolInvocation` on the node instead of
//! propagating (see `crate::searcher`).

use thiserror::Error;

/// Fatal session error.
///
/// Returned by planner/searcher calls and surfaced as the terminal snapshot's
/// failure. Partial graph state is preserved by the session loop for every
/// variant except `Configuration`, which fires before any turn starts.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// Missing or invalid configuration (e.g. no API key for the selected
    /// backend). Raised during construction, never mid-session.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Model output could not be parsed into a structured action after the
    /// one permitted retry.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The planner was invoked `max_turn` times without a Finish decision.
    #[error("turn budget exhausted after {max_turn} turns")]
    BudgetExceeded { max_turn: usize },

    /// The LLM backend call itself failed (transport, auth, rate limit).
    #[error("llm call failed: {0}")]
    Llm(String),
}
