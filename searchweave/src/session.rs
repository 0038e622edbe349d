//! Session: the sequential pipeline and its snapshot stream.
//!
//! One session processes one question: planner decision, searcher resolution,
//! snapshot emission, repeated until Finish, budget exhaustion, or a fatal
//! error. The run loop executes on a spawned task and emits copy-on-emit
//! snapshots over a bounded channel; dropping the receiver cancels the loop
//! at the next emission, so no orphaned model or tool calls outlive the
//! consumer by more than the in-flight call.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::graph::{ReasoningGraph, ReasoningNode};
use crate::llm::LlmClient;
use crate::planner::{Planner, PlannerDecision};
use crate::protocol::ProtocolAdapter;
use crate::registry::BackendRegistry;
use crate::searcher::Searcher;
use crate::snapshot::{SessionFailure, SessionState, TurnSnapshot};
use crate::tools::SearchTool;

/// Snapshot channel depth; bounded so a slow consumer exerts backpressure
/// instead of letting the producer run arbitrarily ahead.
const SNAPSHOT_CHANNEL_CAPACITY: usize = 16;

/// Finite, non-restartable sequence of turn snapshots.
pub type SnapshotStream = ReceiverStream<TurnSnapshot>;

/// One end-to-end processing of a single user question.
///
/// Owns its graph and turn counter; discarded at session end. Create a new
/// session to retry a question.
///
/// **Interaction**: Built from a `BackendRegistry` handle and a `SearchTool`;
/// consumed by `stream` (the spec's consumer-facing entry point) or
/// `run_to_completion`.
pub struct Session {
    config: SessionConfig,
    planner: Planner,
    searcher: Searcher,
}

impl Session {
    /// Builds a session from a registry-selected backend and a search tool.
    ///
    /// Fails with a `Configuration` error for invalid limits or an unknown
    /// backend selector, before any turn starts.
    pub fn open(
        registry: &BackendRegistry,
        backend_selector: &str,
        tool: Arc<dyn SearchTool>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let llm = registry.get(backend_selector)?;
        Ok(Self::with_client(llm, tool, config))
    }

    /// Builds a session from an explicit client (tests, embedders).
    pub fn with_client(
        llm: Arc<dyn LlmClient>,
        tool: Arc<dyn SearchTool>,
        config: SessionConfig,
    ) -> Self {
        let protocol = ProtocolAdapter::new(config.locale);
        let planner = Planner::new(Arc::clone(&llm), protocol.clone());
        let searcher = Searcher::new(llm, protocol, tool, config.top_k);
        Self {
            config,
            planner,
            searcher,
        }
    }

    /// Starts the session and returns its snapshot stream.
    ///
    /// The sequence is finite: the last item is a `FinalAnswer` or `Error`
    /// snapshot. Dropping the stream cancels the session.
    pub fn stream(self, question: impl Into<String>) -> SnapshotStream {
        let (tx, rx) = mpsc::channel(SNAPSHOT_CHANNEL_CAPACITY);
        let question = question.into();
        tokio::spawn(async move {
            run_loop(self, question, tx).await;
        });
        ReceiverStream::new(rx)
    }

    /// Drains the stream and returns the terminal snapshot.
    pub async fn run_to_completion(self, question: impl Into<String>) -> Option<TurnSnapshot> {
        use tokio_stream::StreamExt;
        let mut stream = self.stream(question);
        let mut last = None;
        while let Some(snapshot) = stream.next().await {
            last = Some(snapshot);
        }
        last
    }
}

/// Emits one snapshot; `Err(())` means the consumer disconnected.
async fn emit(
    tx: &mpsc::Sender<TurnSnapshot>,
    snapshot: TurnSnapshot,
) -> Result<(), ()> {
    tx.send(snapshot).await.map_err(|_| {
        debug!("snapshot receiver dropped, cancelling session");
    })
}

fn failure_of(err: SessionError, max_turn: usize) -> SessionFailure {
    match err {
        SessionError::Protocol(msg) => SessionFailure::Protocol(msg),
        SessionError::BudgetExceeded { .. } => SessionFailure::BudgetExceeded { max_turn },
        SessionError::Llm(msg) => SessionFailure::Backend(msg),
        SessionError::Configuration(msg) => SessionFailure::Backend(msg),
    }
}

/// The sequential pipeline: planner decision, searcher resolution, snapshot
/// emission, repeated. The only awaits are LLM calls, tool calls, and
/// snapshot sends.
async fn run_loop(session: Session, question: String, tx: mpsc::Sender<TurnSnapshot>) {
    let Session {
        config,
        planner,
        searcher,
    } = session;

    let mut graph = ReasoningGraph::new();
    graph.add_root(question.as_str()).expect("empty graph accepts root");
    let mut turn = 0usize;

    if emit(&tx, TurnSnapshot::capture(SessionState::Running, turn, &graph))
        .await
        .is_err()
    {
        return;
    }

    loop {
        if turn == config.max_turn {
            info!(max_turn = config.max_turn, "turn budget exhausted");
            let snapshot = TurnSnapshot::capture(SessionState::Error, turn, &graph)
                .with_failure(SessionFailure::BudgetExceeded {
                    max_turn: config.max_turn,
                });
            let _ = emit(&tx, snapshot).await;
            return;
        }
        turn += 1;

        let decision = match planner.next_action(&question, &graph).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(error = %e, turn, "planner failed, ending session");
                let snapshot = TurnSnapshot::capture(SessionState::Error, turn, &graph)
                    .with_failure(failure_of(e, config.max_turn));
                let _ = emit(&tx, snapshot).await;
                return;
            }
        };

        match decision {
            PlannerDecision::Finish { response } => {
                // A direct turn-1 finish leaves the graph at just the root;
                // the synthesis node is only materialized when there are
                // resolved sub-answers to link it from.
                let predecessors = graph.resolved_search_ids();
                if !predecessors.is_empty() {
                    if let Err(e) = graph.add_synthesis(response.as_str(), &predecessors) {
                        warn!(error = %e, "synthesis node rejected");
                    }
                }
                info!(turn, "session finished");
                let snapshot = TurnSnapshot::capture(SessionState::FinalAnswer, turn, &graph)
                    .with_response(response);
                let _ = emit(&tx, snapshot).await;
                return;
            }
            PlannerDecision::Expand { nodes, edges } => {
                merge_expansion(&mut graph, nodes, edges);

                for node_id in graph.unresolved_search_nodes() {
                    let sub_question = match graph.node(&node_id) {
                        Some(node) => node.content.clone(),
                        None => continue,
                    };
                    if emit(
                        &tx,
                        TurnSnapshot::capture(SessionState::ToolCalling, turn, &graph),
                    )
                    .await
                    .is_err()
                    {
                        return;
                    }

                    match searcher.resolve(&sub_question, &graph).await {
                        Ok((answer, invocations)) => {
                            let _ = graph.record_detail(&node_id, invocations);
                            let _ = graph.resolve_node(&node_id, answer);
                            debug!(node = %node_id, "node resolved");
                            if emit(
                                &tx,
                                TurnSnapshot::capture(SessionState::NodeFinished, turn, &graph),
                            )
                            .await
                            .is_err()
                            {
                                return;
                            }
                        }
                        Err(e) => {
                            warn!(node = %node_id, error = %e, "searcher failed, ending session");
                            let snapshot = TurnSnapshot::capture(SessionState::Error, turn, &graph)
                                .with_failure(failure_of(e, config.max_turn));
                            let _ = emit(&tx, snapshot).await;
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Merges a planner expansion into the graph.
///
/// Model-proposed nodes and edges are validated by the graph; duplicates and
/// cycle-closing edges are skipped with a warning rather than failing the
/// session, so one bad proposal cannot destroy accumulated state.
fn merge_expansion(
    graph: &mut ReasoningGraph,
    nodes: Vec<crate::protocol::PlannedNode>,
    edges: Vec<(String, String)>,
) {
    for planned in nodes {
        if let Err(e) = graph.add_node(ReasoningNode::search(planned.id, planned.question)) {
            warn!(error = %e, "skipping planned node");
        }
    }
    for (from, to) in edges {
        if let Err(e) = graph.add_edge(&from, &to) {
            warn!(error = %e, "skipping planned edge");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::protocol::{Locale, PlannedNode};
    use crate::tools::MockSearchTool;
    use tokio_stream::StreamExt;

    fn session(llm: MockLlm, max_turn: usize) -> Session {
        Session::with_client(
            Arc::new(llm),
            Arc::new(MockSearchTool::with_hits(vec![MockSearchTool::hit("h")])),
            SessionConfig::new()
                .with_locale(Locale::En)
                .with_max_turn(max_turn)
                .with_top_k(3),
        )
    }

    /// **Scenario**: merge_expansion skips invalid proposals without failing.
    #[test]
    fn merge_expansion_tolerates_bad_proposals() {
        let mut graph = ReasoningGraph::new();
        graph.add_root("q").unwrap();
        merge_expansion(
            &mut graph,
            vec![
                PlannedNode {
                    id: "a".to_string(),
                    question: "A?".to_string(),
                },
                PlannedNode {
                    id: "root".to_string(), // duplicate, skipped
                    question: "again".to_string(),
                },
            ],
            vec![
                ("root".to_string(), "a".to_string()),
                ("a".to_string(), "root".to_string()), // cycle, skipped
                ("root".to_string(), "ghost".to_string()), // unknown, skipped
            ],
        );
        assert_eq!(graph.nodes().len(), 2);
        assert_eq!(graph.adjacency().get("root").unwrap(), &["a"]);
        assert!(graph.adjacency().get("a").unwrap().is_empty());
    }

    /// **Scenario**: dropping the stream after the first snapshot cancels the
    /// session at its next emission instead of looping to the turn budget.
    #[tokio::test]
    async fn dropping_stream_cancels_session() {
        let llm = MockLlm::repeating(
            r#"{"action": "expand", "nodes": [{"id": "n1", "question": "Q?"}], "edges": [["root", "n1"]]}"#,
        );
        let mut stream = session(llm, 100).stream("q");
        let first = stream.next().await.unwrap();
        assert_eq!(first.state, SessionState::Running);
        drop(stream);
        // The spawned task stops at its next emission; nothing to assert
        // beyond not hanging, which the test runtime enforces.
    }

    /// **Scenario**: failure_of maps each fatal error to its snapshot failure.
    #[test]
    fn failure_mapping() {
        assert!(matches!(
            failure_of(SessionError::Protocol("p".to_string()), 5),
            SessionFailure::Protocol(_)
        ));
        assert!(matches!(
            failure_of(SessionError::Llm("t".to_string()), 5),
            SessionFailure::Backend(_)
        ));
        assert!(matches!(
            failure_of(SessionError::BudgetExceeded { max_turn: 5 }, 5),
            SessionFailure::BudgetExceeded { max_turn: 5 }
        ));
    }
}
