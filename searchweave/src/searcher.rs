//! Searcher: resolves one sub-question through tool calls plus a reduce call.
//!
//! Flow: ask the model (searcher role) which queries to run, execute them
//! through the search tool, then reduce the accumulated results into a
//! node-local answer. Tool failures degrade to an empty-result invocation so
//! partial information still reaches the planner; they never abort the turn.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::SessionError;
use crate::graph::{ReasoningGraph, ToolInvocation, ToolResultFragment};
use crate::llm::LlmClient;
use crate::protocol::{invoke_structured, ProtocolAdapter, Role, StructuredAction};
use crate::tools::{SearchHit, SearchTool};

/// Resolves sub-questions; one instance serves a whole session.
///
/// **Interaction**: Called by the session loop for each unresolved search
/// node after a planner Expand; the returned answer and invocations are
/// written into the graph there.
pub struct Searcher {
    llm: Arc<dyn LlmClient>,
    protocol: ProtocolAdapter,
    tool: Arc<dyn SearchTool>,
    top_k: usize,
}

impl Searcher {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        protocol: ProtocolAdapter,
        tool: Arc<dyn SearchTool>,
        top_k: usize,
    ) -> Self {
        Self {
            llm,
            protocol,
            tool,
            top_k,
        }
    }

    /// Resolves one sub-question: `(answer, tool invocations in call order)`.
    pub async fn resolve(
        &self,
        sub_question: &str,
        graph: &ReasoningGraph,
    ) -> Result<(String, Vec<ToolInvocation>), SessionError> {
        let messages = self.protocol.format_searcher_prompt(sub_question, graph);
        let action =
            invoke_structured(self.llm.as_ref(), &self.protocol, Role::Searcher, messages).await?;

        let queries = match action {
            StructuredAction::Answer { response } => {
                debug!(%sub_question, "searcher answered without tools");
                return Ok((response, vec![]));
            }
            StructuredAction::Search { queries } => queries,
            other => {
                return Err(SessionError::Protocol(format!(
                    "unexpected searcher action: {:?}",
                    other
                )))
            }
        };

        let mut invocations = Vec::with_capacity(queries.len());
        for query in &queries {
            invocations.push(self.run_query(query).await);
        }

        let tool_output = render_tool_output(&invocations);
        let reduce = self.protocol.format_reduce_prompt(sub_question, &tool_output);
        let answer = self.llm.invoke(&reduce).await?;
        Ok((answer.trim().to_string(), invocations))
    }

    /// Runs one query; failures are recorded on the invocation, not returned.
    async fn run_query(&self, query: &str) -> ToolInvocation {
        let parameters: HashMap<String, String> = [
            ("query".to_string(), query.to_string()),
            ("top_k".to_string(), self.top_k.to_string()),
        ]
        .into_iter()
        .collect();

        match self.tool.search(query, self.top_k).await {
            Ok(hits) => ToolInvocation {
                name: self.tool.name().to_string(),
                parameters,
                result: hits.iter().map(render_hit).collect(),
                error: None,
            },
            Err(e) => {
                warn!(%query, error = %e, "search tool call degraded");
                ToolInvocation {
                    name: self.tool.name().to_string(),
                    parameters,
                    result: vec![],
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

fn render_hit(hit: &SearchHit) -> ToolResultFragment {
    let mut content = String::new();
    if !hit.title.is_empty() {
        content.push_str(&hit.title);
        content.push('\n');
    }
    if !hit.url.is_empty() {
        content.push_str(&hit.url);
        content.push('\n');
    }
    content.push_str(&hit.content);
    ToolResultFragment { content }
}

/// Renders all invocation results as numbered blocks for the reduce prompt.
fn render_tool_output(invocations: &[ToolInvocation]) -> String {
    let mut out = String::new();
    let mut index = 0;
    for inv in invocations {
        for fragment in &inv.result {
            index += 1;
            out.push_str(&format!("[{}] {}\n", index, fragment.content.trim()));
        }
    }
    if out.is_empty() {
        out.push_str("(no results)");
    }
    out
}
