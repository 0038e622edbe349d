//! Reasoning graph: nodes, adjacency, and append-only mutation rules.
//!
//! The planner grows the graph (new sub-question nodes and edges); the
//! searcher resolves nodes in place. Mutations are append-only: nodes are
//! never removed, a set `response` is never cleared, and edges that would
//! create a cycle are rejected so the planning loop terminates.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Id of the root node holding the user question.
pub const ROOT_NODE: &str = "root";

/// Id of the synthesis node holding the final answer.
pub const SYNTHESIS_NODE: &str = "response";

/// Kind of reasoning work a node represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NodeKind {
    /// A sub-question resolved through search tool calls.
    Search,
    /// The final synthesis step; holds the session's answer.
    Synthesis,
}

/// One fragment of a tool result (e.g. one search hit rendered as text).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolResultFragment {
    pub content: String,
}

/// Record of one external tool call made while resolving a node.
///
/// Degraded failures (timeout, rate limit, empty result) keep `result` empty
/// and set `error`; they never abort the enclosing turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Tool name (e.g. "web_search").
    pub name: String,
    /// Call parameters as rendered strings (e.g. query, top_k).
    pub parameters: HashMap<String, String>,
    /// Ordered content fragments; empty on failure or empty result.
    #[serde(default)]
    pub result: Vec<ToolResultFragment>,
    /// Failure description when the call degraded.
    #[serde(default)]
    pub error: Option<String>,
}

/// One node in the reasoning graph.
///
/// Produced by the planner (search nodes) or by the session on Finish
/// (synthesis node). The searcher writes `response` and `detail`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningNode {
    /// Unique id within the graph (e.g. "root", "weather_tokyo").
    pub id: String,
    /// The sub-question, or the synthesized text for the synthesis node.
    pub content: String,
    /// Search vs synthesis.
    pub kind: NodeKind,
    /// Node-local answer; write-once, set when the node is resolved.
    #[serde(default)]
    pub response: Option<String>,
    /// Tool calls made while resolving this node, in call order.
    #[serde(default)]
    pub detail: Vec<ToolInvocation>,
}

impl ReasoningNode {
    /// Creates an unresolved search node for a sub-question.
    pub fn search(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            kind: NodeKind::Search,
            response: None,
            detail: vec![],
        }
    }
}

/// Error returned when a mutation would violate graph invariants.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GraphError {
    /// A new node reuses an existing id.
    #[error("duplicate node id: {0}")]
    DuplicateNodeId(String),
    /// An edge or mutation references a node id not in the graph.
    #[error("unknown node id: {0}")]
    UnknownNode(String),
    /// Adding the edge would create a cycle.
    #[error("edge {from} -> {to} would create a cycle")]
    WouldCreateCycle { from: String, to: String },
    /// The node's response is already set; responses are write-once.
    #[error("response already set for node: {0}")]
    ResponseAlreadySet(String),
}

/// Directed acyclic graph of reasoning nodes.
///
/// Nodes keep insertion (discovery) order; adjacency lists keep edge insertion
/// order. Every neighbor id in the adjacency list refers to an existing node.
///
/// **Interaction**: Grown by the session loop from `PlannerDecision::Expand`;
/// read by the protocol adapter when building prompts; copied whole into each
/// `TurnSnapshot`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReasoningGraph {
    nodes: Vec<ReasoningNode>,
    adjacency: HashMap<String, Vec<String>>,
}

impl ReasoningGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the root search node holding the user question.
    pub fn add_root(&mut self, question: impl Into<String>) -> Result<(), GraphError> {
        self.add_node(ReasoningNode::search(ROOT_NODE, question))
    }

    /// Appends a node. Rejects duplicate ids without mutating.
    pub fn add_node(&mut self, node: ReasoningNode) -> Result<(), GraphError> {
        if self.contains(&node.id) {
            return Err(GraphError::DuplicateNodeId(node.id));
        }
        self.adjacency.entry(node.id.clone()).or_default();
        self.nodes.push(node);
        Ok(())
    }

    /// Appends a directed edge `from -> to`.
    ///
    /// Both endpoints must exist and the edge must not create a cycle; on
    /// rejection the graph is unchanged. Duplicate edges are ignored.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        if !self.contains(from) {
            return Err(GraphError::UnknownNode(from.to_string()));
        }
        if !self.contains(to) {
            return Err(GraphError::UnknownNode(to.to_string()));
        }
        let neighbors = self.adjacency.get(from).map(|v| v.as_slice()).unwrap_or(&[]);
        if neighbors.iter().any(|n| n == to) {
            return Ok(());
        }
        if from == to || self.reaches(to, from) {
            return Err(GraphError::WouldCreateCycle {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        self.adjacency.get_mut(from).expect("endpoint checked").push(to.to_string());
        Ok(())
    }

    /// Sets a node's response. Responses are write-once.
    pub fn resolve_node(&mut self, id: &str, response: impl Into<String>) -> Result<(), GraphError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
        if node.response.is_some() {
            return Err(GraphError::ResponseAlreadySet(id.to_string()));
        }
        node.response = Some(response.into());
        Ok(())
    }

    /// Appends tool invocation records to a node's detail, in call order.
    pub fn record_detail(
        &mut self,
        id: &str,
        invocations: Vec<ToolInvocation>,
    ) -> Result<(), GraphError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
        node.detail.extend(invocations);
        Ok(())
    }

    /// Appends the synthesis node with edges from each named predecessor.
    ///
    /// The synthesis node's `content` and `response` both carry the final
    /// answer, matching the consumer contract (top-level response plus a
    /// resolved terminal node).
    pub fn add_synthesis(
        &mut self,
        content: impl Into<String>,
        predecessors: &[String],
    ) -> Result<(), GraphError> {
        let content = content.into();
        self.add_node(ReasoningNode {
            id: SYNTHESIS_NODE.to_string(),
            content: content.clone(),
            kind: NodeKind::Synthesis,
            response: Some(content),
            detail: vec![],
        })?;
        for pred in predecessors {
            self.add_edge(pred, SYNTHESIS_NODE)?;
        }
        Ok(())
    }

    /// Returns true when a node with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// Looks up a node by id.
    pub fn node(&self, id: &str) -> Option<&ReasoningNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// All nodes in discovery order.
    pub fn nodes(&self) -> &[ReasoningNode] {
        &self.nodes
    }

    /// Adjacency lists (node id -> neighbor ids in edge insertion order).
    pub fn adjacency(&self) -> &HashMap<String, Vec<String>> {
        &self.adjacency
    }

    /// (id, response) pairs for every resolved search node, in discovery
    /// order. Used by the protocol adapter to build planner context.
    pub fn resolved_context(&self) -> Vec<(&str, &str)> {
        self.nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Search && n.id != ROOT_NODE)
            .filter_map(|n| n.response.as_deref().map(|r| (n.id.as_str(), r)))
            .collect()
    }

    /// Ids of resolved search nodes (synthesis predecessors on Finish).
    pub fn resolved_search_ids(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Search && n.id != ROOT_NODE && n.response.is_some())
            .map(|n| n.id.clone())
            .collect()
    }

    /// Ids of search nodes that have no response yet, in discovery order.
    pub fn unresolved_search_nodes(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Search && n.id != ROOT_NODE && n.response.is_none())
            .map(|n| n.id.clone())
            .collect()
    }

    /// True when `from` can reach `to` following directed edges.
    fn reaches(&self, from: &str, to: &str) -> bool {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(neighbors) = self.adjacency.get(id) {
                stack.extend(neighbors.iter().map(|s| s.as_str()));
            }
        }
        false
    }
}
