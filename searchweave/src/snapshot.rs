//! Point-in-time views of a running session.
//!
//! The session loop emits one `TurnSnapshot` per observable transition.
//! Each snapshot is a fully materialized copy of graph state (copy-on-emit):
//! later mutation of the live graph is never visible through an already
//! emitted snapshot.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::graph::{ReasoningGraph, ReasoningNode};

/// Observable session state carried by each snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionState {
    /// The planner is deciding the next action.
    Running,
    /// A node's searcher is issuing tool calls.
    ToolCalling,
    /// A search node was just resolved.
    NodeFinished,
    /// Terminal: the synthesis node holds the final answer.
    FinalAnswer,
    /// Terminal: the session failed; `failure` names the condition.
    Error,
}

/// Why a session ended without a final answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionFailure {
    /// Model output stayed unparseable after the one permitted retry.
    Protocol(String),
    /// The planner budget ran out before a Finish decision.
    BudgetExceeded { max_turn: usize },
    /// The LLM backend failed mid-session (transport, auth, rate limit).
    Backend(String),
}

/// Immutable view of graph state at one point in the session.
///
/// `response` is populated only in the terminal `FinalAnswer` snapshot;
/// `failure` only when `state` is `Error`. The node map and adjacency list of
/// each snapshot are supersets of the previous snapshot's (append-only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnSnapshot {
    pub state: SessionState,
    /// Planner turns consumed so far.
    pub turn: usize,
    /// Node id -> node, copied from the live graph.
    pub nodes: HashMap<String, ReasoningNode>,
    /// Node id -> neighbor ids in discovery order.
    pub adjacency: HashMap<String, Vec<String>>,
    /// Final synthesized answer; terminal FinalAnswer snapshot only.
    #[serde(default)]
    pub response: Option<String>,
    /// Failure condition; Error snapshots only.
    #[serde(default)]
    pub failure: Option<SessionFailure>,
}

impl TurnSnapshot {
    /// Materializes a snapshot from the live graph (copy-on-emit).
    pub fn capture(state: SessionState, turn: usize, graph: &ReasoningGraph) -> Self {
        Self {
            state,
            turn,
            nodes: graph
                .nodes()
                .iter()
                .map(|n| (n.id.clone(), n.clone()))
                .collect(),
            adjacency: graph.adjacency().clone(),
            response: None,
            failure: None,
        }
    }

    /// Attaches the final response (terminal FinalAnswer snapshot).
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    /// Attaches the failure condition (terminal Error snapshot).
    pub fn with_failure(mut self, failure: SessionFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// True for FinalAnswer and Error snapshots.
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, SessionState::FinalAnswer | SessionState::Error)
    }
}
