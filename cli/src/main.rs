//! SearchWeave CLI: run one session and print snapshots as they arrive.
//!
//! `searchweave "question"` streams state transitions, node updates, and the
//! final answer to stdout. `--mock` runs without credentials against the
//! scripted backends; otherwise the OpenAI backend and web search tool are
//! built from the environment (`OPENAI_API_KEY`, `SEARCH_API_KEY`).

use std::collections::HashSet;
use std::sync::Arc;

use clap::Parser;
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

use searchweave::{
    search_api_key_from_env, BackendRegistry, ChatOpenAI, Locale, MockLlm, MockSearchTool,
    Session, SessionConfig, SessionError, SessionState, TurnSnapshot, WebSearchTool,
};

#[derive(Parser, Debug)]
#[command(name = "searchweave")]
#[command(about = "SearchWeave — answer a question through planned web search")]
struct Args {
    /// The question to answer
    question: String,

    /// Prompt locale: en, cn, or ja
    #[arg(short, long, default_value = "en")]
    locale: Locale,

    /// Backend selector (model name registered in the backend registry)
    #[arg(short, long, default_value = "gpt-4o-mini", env = "SEARCHWEAVE_BACKEND")]
    backend: String,

    /// Planner turn budget
    #[arg(long, default_value_t = 10)]
    max_turn: usize,

    /// Search hits per query
    #[arg(long, default_value_t = 6)]
    top_k: usize,

    /// Run against mock backends (no credentials needed)
    #[arg(long)]
    mock: bool,

    /// Verbose: print every state transition, not just node updates
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), SessionError> {
    let config = SessionConfig::new()
        .with_locale(args.locale)
        .with_max_turn(args.max_turn)
        .with_top_k(args.top_k);

    let session = if args.mock {
        let registry = BackendRegistry::builder()
            .register(
                args.backend.as_str(),
                Arc::new(MockLlm::repeating(
                    r#"{"action": "finish", "response": "(mock) no real backend configured"}"#,
                )),
            )
            .build()?;
        Session::open(
            &registry,
            &args.backend,
            Arc::new(MockSearchTool::empty()),
            config,
        )?
    } else {
        let registry = BackendRegistry::builder()
            .register(
                args.backend.as_str(),
                Arc::new(ChatOpenAI::new(args.backend.as_str())),
            )
            .build()?;
        let tool = WebSearchTool::new(search_api_key_from_env()?);
        Session::open(&registry, &args.backend, Arc::new(tool), config)?
    };

    let mut stream = session.stream(args.question.as_str());
    let mut printed: HashSet<String> = HashSet::new();
    while let Some(snapshot) = stream.next().await {
        print_snapshot(&snapshot, &mut printed, args.verbose);
    }
    Ok(())
}

/// Prints one snapshot: state line when verbose, each newly resolved node
/// once, and the terminal response or failure.
fn print_snapshot(snapshot: &TurnSnapshot, printed: &mut HashSet<String>, verbose: bool) {
    if verbose {
        println!(
            "[turn {}] {:?} ({} nodes)",
            snapshot.turn,
            snapshot.state,
            snapshot.nodes.len()
        );
    }

    if snapshot.state == SessionState::NodeFinished {
        for node in snapshot.nodes.values() {
            let Some(response) = &node.response else {
                continue;
            };
            if !printed.insert(node.id.clone()) {
                continue;
            }
            if verbose {
                for inv in &node.detail {
                    println!(
                        "  tool {} {:?} -> {} fragment(s)",
                        inv.name,
                        inv.parameters.get("query"),
                        inv.result.len()
                    );
                }
            }
            println!("* {}: {}", node.id, response);
        }
    }

    if let Some(response) = &snapshot.response {
        println!("\n{}", response);
    }
    if let Some(failure) = &snapshot.failure {
        eprintln!("session failed: {:?}", failure);
    }
}
