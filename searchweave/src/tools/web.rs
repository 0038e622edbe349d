//! Web search tool over the Exa search API.
//!
//! POSTs `{"query", "numResults"}` with an `x-api-key` header and reads
//! `results[].{title,url,content}` from the JSON body. The endpoint is
//! overridable via `SEARCH_API_URL` for self-hosted gateways speaking the
//! same protocol.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::{SearchHit, SearchTool, ToolError};

const SEARCH_API_URL: &str = "https://api.exa.ai/search";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

fn search_api_url() -> String {
    std::env::var("SEARCH_API_URL").unwrap_or_else(|_| SEARCH_API_URL.to_string())
}

/// HTTP web search implementing `SearchTool`.
///
/// Built from an API key resolved by configuration before the session starts;
/// the client is constructed once and reused across calls.
pub struct WebSearchTool {
    client: reqwest::Client,
    api_key: String,
}

impl WebSearchTool {
    /// Creates the tool with the given API key. Each request carries a
    /// bounded timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    fn parse_hits(body: &serde_json::Value, top_k: usize) -> Result<Vec<SearchHit>, ToolError> {
        let results = body
            .get("results")
            .and_then(|r| r.as_array())
            .ok_or_else(|| ToolError::BadResponse("missing results array".to_string()))?;
        Ok(results
            .iter()
            .take(top_k)
            .map(|r| SearchHit {
                title: r
                    .get("title")
                    .and_then(|t| t.as_str())
                    .unwrap_or_default()
                    .to_string(),
                url: r
                    .get("url")
                    .and_then(|u| u.as_str())
                    .unwrap_or_default()
                    .to_string(),
                content: r
                    .get("content")
                    .and_then(|c| c.as_str())
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect())
    }
}

#[async_trait]
impl SearchTool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>, ToolError> {
        let url = search_api_url();
        debug!(%query, top_k, %url, "web search request");
        let res = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .header("x-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&json!({ "query": query, "numResults": top_k }))
            .send()
            .await
            .map_err(|e| ToolError::Transport(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ToolError::Transport(format!(
                "search API error {}: {}",
                status, body
            )));
        }
        let body: serde_json::Value = res
            .json()
            .await
            .map_err(|e| ToolError::BadResponse(e.to_string()))?;
        Self::parse_hits(&body, top_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: without an override, requests go to the Exa endpoint
    /// whose request/response shape this tool speaks.
    #[test]
    fn default_endpoint_is_exa() {
        if std::env::var("SEARCH_API_URL").is_ok() {
            return;
        }
        assert_eq!(search_api_url(), "https://api.exa.ai/search");
    }

    /// **Scenario**: a well-formed body yields hits in order, truncated to top_k.
    #[test]
    fn parse_hits_well_formed() {
        let body = serde_json::json!({
            "results": [
                {"title": "t1", "url": "u1", "content": "c1"},
                {"title": "t2", "url": "u2", "content": "c2"},
                {"title": "t3", "url": "u3", "content": "c3"},
            ]
        });
        let hits = WebSearchTool::parse_hits(&body, 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "t1");
        assert_eq!(hits[1].content, "c2");
    }

    /// **Scenario**: a body without a results array is a BadResponse error.
    #[test]
    fn parse_hits_missing_results() {
        let body = serde_json::json!({"message": "rate limited"});
        assert!(matches!(
            WebSearchTool::parse_hits(&body, 5),
            Err(ToolError::BadResponse(_))
        ));
    }

    /// **Scenario**: hits with missing fields default to empty strings.
    #[test]
    fn parse_hits_partial_fields() {
        let body = serde_json::json!({"results": [{"title": "only title"}]});
        let hits = WebSearchTool::parse_hits(&body, 5).unwrap();
        assert_eq!(hits[0].title, "only title");
        assert!(hits[0].url.is_empty());
        assert!(hits[0].content.is_empty());
    }
}
