//! # SearchWeave
//!
//! A streaming multi-step search-and-reasoning orchestrator. One **session**
//! answers one user question by growing a directed acyclic graph of
//! sub-questions, resolving each through web-search tool calls reduced by an
//! LLM, and streaming the evolving graph as immutable snapshots until a
//! synthesized final answer (or a failure) ends the sequence.
//!
//! ## Design principles
//!
//! - **Planner / searcher split**: the planner decides, per turn, whether to
//!   expand the graph or finish ([`Planner`], [`PlannerDecision`]); the
//!   searcher resolves one sub-question at a time ([`Searcher`]).
//! - **Protocol adapter in the middle**: all prompting and output parsing
//!   lives in [`ProtocolAdapter`]; planner and searcher hold no
//!   model-specific logic. Malformed output is retried exactly once.
//! - **Copy-on-emit streaming**: every [`TurnSnapshot`] is a materialized
//!   copy of graph state; the sequence is finite, append-only, and not
//!   restartable. Dropping the stream cancels the session.
//! - **Degraded, not dead**: tool failures become empty-result
//!   [`ToolInvocation`]s on the node; only protocol, backend, and budget
//!   failures end a session, and even then the partial graph is in the
//!   terminal snapshot.
//!
//! ## Main modules
//!
//! - [`session`]: [`Session`], [`SnapshotStream`] — the pipeline and entry point.
//! - [`graph`]: [`ReasoningGraph`], [`ReasoningNode`], [`ToolInvocation`].
//! - [`snapshot`]: [`TurnSnapshot`], [`SessionState`], [`SessionFailure`].
//! - [`planner`] / [`searcher`]: the two decision roles.
//! - [`protocol`]: [`ProtocolAdapter`], [`Locale`], [`StructuredAction`].
//! - [`llm`]: [`LlmClient`] trait, [`MockLlm`], [`ChatOpenAI`].
//! - [`tools`]: [`SearchTool`] trait, [`MockSearchTool`], [`WebSearchTool`].
//! - [`registry`]: [`BackendRegistry`] — construct-once backend handles.
//! - [`config`]: [`SessionConfig`], env credential loading.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio_stream::StreamExt;
//! use searchweave::{
//!     BackendRegistry, Locale, MockLlm, MockSearchTool, Session, SessionConfig,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), searchweave::SessionError> {
//! let registry = BackendRegistry::builder()
//!     .register("mock", Arc::new(MockLlm::repeating(
//!         r#"{"action": "finish", "response": "Paris"}"#,
//!     )))
//!     .build()?;
//! let session = Session::open(
//!     &registry,
//!     "mock",
//!     Arc::new(MockSearchTool::empty()),
//!     SessionConfig::new().with_locale(Locale::En),
//! )?;
//! let mut stream = session.stream("What is the capital of France?");
//! while let Some(snapshot) = stream.next().await {
//!     println!("{:?}: {} nodes", snapshot.state, snapshot.nodes.len());
//!     if let Some(response) = snapshot.response {
//!         println!("{}", response);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod llm;
pub mod message;
pub mod planner;
pub mod protocol;
pub mod registry;
pub mod searcher;
pub mod session;
pub mod snapshot;
pub mod tools;

pub use config::{search_api_key_from_env, SessionConfig, SEARCH_API_KEY_VAR};
pub use error::SessionError;
pub use graph::{
    GraphError, NodeKind, ReasoningGraph, ReasoningNode, ToolInvocation, ToolResultFragment,
    ROOT_NODE, SYNTHESIS_NODE,
};
pub use llm::{ChatOpenAI, LlmClient, MockLlm};
pub use message::Message;
pub use planner::{Planner, PlannerDecision};
pub use protocol::{
    Locale, ParseError, PlannedNode, ProtocolAdapter, Role, StructuredAction,
};
pub use registry::{BackendRegistry, BackendRegistryBuilder};
pub use searcher::Searcher;
pub use session::{Session, SnapshotStream};
pub use snapshot::{SessionFailure, SessionState, TurnSnapshot};
pub use tools::{MockSearchTool, SearchHit, SearchTool, ToolError, WebSearchTool};

/// When running `cargo test -p searchweave`, initializes tracing from
/// `RUST_LOG` so unit tests in `src/**` can print logs with `--nocapture`.
#[cfg(test)]
mod test_logging {
    use ctor::ctor;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::Layer;

    #[ctor]
    fn init() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_filter(filter),
            )
            .try_init();
    }
}
