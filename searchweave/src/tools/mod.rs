//! Search tool collaborator.
//!
//! The searcher depends on one pluggable capability:
//! `search(query, top_k) -> ordered hits`. Failures are typed so the caller
//! can degrade them to an empty-result invocation instead of aborting the
//! turn. Credentials come from configuration, not from this module.

mod web;

pub use web::WebSearchTool;

use std::sync::Mutex;

use async_trait::async_trait;

/// One search result.
#[derive(Debug, Clone, Default)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub content: String,
}

/// Error from a single tool call. Non-fatal by contract: the searcher records
/// it on the `ToolInvocation` and continues.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ToolError {
    /// HTTP/transport failure (timeout, connection, rate limit).
    #[error("search transport error: {0}")]
    Transport(String),
    /// The API answered but the body was not the expected shape.
    #[error("unexpected search response: {0}")]
    BadResponse(String),
}

/// Search/browse capability: ordered hits for a query.
#[async_trait]
pub trait SearchTool: Send + Sync {
    /// Tool name recorded on `ToolInvocation`s (e.g. "web_search").
    fn name(&self) -> &str;

    /// Runs one query, returning at most `top_k` hits in rank order.
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>, ToolError>;
}

/// Mock search tool: scripted outcomes per call, for tests and `--mock` runs.
///
/// Each call pops the next scripted outcome; when the script is empty the
/// default hit set is returned.
pub struct MockSearchTool {
    script: Mutex<Vec<Result<Vec<SearchHit>, ToolError>>>,
    default: Vec<SearchHit>,
}

impl MockSearchTool {
    /// Always returns the given hits.
    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            script: Mutex::new(vec![]),
            default: hits,
        }
    }

    /// Always returns no hits (empty-result scenario).
    pub fn empty() -> Self {
        Self::with_hits(vec![])
    }

    /// Pops scripted outcomes first (in push order), then the default hits.
    pub fn with_script(script: Vec<Result<Vec<SearchHit>, ToolError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().rev().collect()),
            default: vec![],
        }
    }

    /// Convenience: a single textual hit.
    pub fn hit(content: impl Into<String>) -> SearchHit {
        SearchHit {
            title: String::new(),
            url: String::new(),
            content: content.into(),
        }
    }
}

#[async_trait]
impl SearchTool for MockSearchTool {
    fn name(&self) -> &str {
        "mock_search"
    }

    async fn search(&self, _query: &str, top_k: usize) -> Result<Vec<SearchHit>, ToolError> {
        let scripted = self.script.lock().expect("mock lock").pop();
        match scripted {
            Some(outcome) => outcome.map(|hits| hits.into_iter().take(top_k).collect()),
            None => Ok(self.default.iter().take(top_k).cloned().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: default hits are truncated to top_k.
    #[tokio::test]
    async fn mock_truncates_to_top_k() {
        let tool = MockSearchTool::with_hits(vec![
            MockSearchTool::hit("a"),
            MockSearchTool::hit("b"),
            MockSearchTool::hit("c"),
        ]);
        let hits = tool.search("q", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content, "a");
    }

    /// **Scenario**: scripted outcomes are consumed in push order, including
    /// errors, then the default applies.
    #[tokio::test]
    async fn mock_script_order() {
        let tool = MockSearchTool::with_script(vec![
            Ok(vec![MockSearchTool::hit("first")]),
            Err(ToolError::Transport("down".to_string())),
        ]);
        assert_eq!(tool.search("q", 5).await.unwrap()[0].content, "first");
        assert!(matches!(
            tool.search("q", 5).await,
            Err(ToolError::Transport(_))
        ));
        assert!(tool.search("q", 5).await.unwrap().is_empty());
    }
}
