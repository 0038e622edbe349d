//! Planner: decides each turn whether to expand the graph or finish.
//!
//! One LLM call (plus at most one protocol retry) per invocation. Holds no
//! model-specific logic; prompting and parsing go through the protocol
//! adapter. Budget enforcement lives in the session loop, never here.

use std::sync::Arc;

use tracing::debug;

use crate::error::SessionError;
use crate::graph::ReasoningGraph;
use crate::llm::LlmClient;
use crate::protocol::{
    invoke_structured, PlannedNode, ProtocolAdapter, Role, StructuredAction,
};

/// Decision for one planner turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannerDecision {
    /// Grow the graph with new sub-question nodes and edges.
    Expand {
        nodes: Vec<PlannedNode>,
        edges: Vec<(String, String)>,
    },
    /// Terminate with the final synthesized answer.
    Finish { response: String },
}

/// Derives the next action from the current graph content via one LLM call.
///
/// **Interaction**: Called once per turn by the session loop; the returned
/// `Expand` nodes/edges are merged into the graph there so graph invariants
/// stay in one place.
pub struct Planner {
    llm: Arc<dyn LlmClient>,
    protocol: ProtocolAdapter,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>, protocol: ProtocolAdapter) -> Self {
        Self { llm, protocol }
    }

    /// One planner turn: graph content in, decision out.
    pub async fn next_action(
        &self,
        question: &str,
        graph: &ReasoningGraph,
    ) -> Result<PlannerDecision, SessionError> {
        let messages = self.protocol.format_planner_prompt(question, graph);
        let action =
            invoke_structured(self.llm.as_ref(), &self.protocol, Role::Planner, messages).await?;
        let decision = match action {
            StructuredAction::Expand { nodes, edges } => PlannerDecision::Expand { nodes, edges },
            StructuredAction::Finish { response } => PlannerDecision::Finish { response },
            // parse_response only yields planner actions for Role::Planner
            other => {
                return Err(SessionError::Protocol(format!(
                    "unexpected planner action: {:?}",
                    other
                )))
            }
        };
        debug!(?decision, "planner decision");
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::protocol::Locale;

    fn planner(llm: MockLlm) -> Planner {
        Planner::new(
            Arc::new(llm),
            ProtocolAdapter::with_date(Locale::En, "2026-01-01"),
        )
    }

    /// **Scenario**: expand reply becomes an Expand decision with nodes and edges.
    #[tokio::test]
    async fn next_action_expand() {
        let llm = MockLlm::scripted([
            r#"{"action": "expand", "nodes": [{"id": "a", "question": "A?"}], "edges": [["root", "a"]]}"#,
        ]);
        let mut graph = ReasoningGraph::new();
        graph.add_root("q").unwrap();
        let decision = planner(llm).next_action("q", &graph).await.unwrap();
        match decision {
            PlannerDecision::Expand { nodes, edges } => {
                assert_eq!(nodes.len(), 1);
                assert_eq!(nodes[0].id, "a");
                assert_eq!(edges, [("root".to_string(), "a".to_string())]);
            }
            other => panic!("expected Expand, got {:?}", other),
        }
    }

    /// **Scenario**: finish reply becomes a Finish decision carrying the answer.
    #[tokio::test]
    async fn next_action_finish() {
        let llm = MockLlm::scripted([r#"{"action": "finish", "response": "Paris"}"#]);
        let mut graph = ReasoningGraph::new();
        graph.add_root("q").unwrap();
        let decision = planner(llm).next_action("q", &graph).await.unwrap();
        assert_eq!(
            decision,
            PlannerDecision::Finish {
                response: "Paris".to_string()
            }
        );
    }

    /// **Scenario**: two malformed replies surface as a Protocol error.
    #[tokio::test]
    async fn next_action_protocol_error() {
        let llm = MockLlm::scripted(["bad", "worse"]);
        let mut graph = ReasoningGraph::new();
        graph.add_root("q").unwrap();
        let err = planner(llm).next_action("q", &graph).await.unwrap_err();
        assert!(matches!(err, SessionError::Protocol(_)));
    }
}
