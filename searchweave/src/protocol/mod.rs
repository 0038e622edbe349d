//! Protocol adapter: prompts out, structured actions back.
//!
//! Converts planner/searcher intentions into prompt messages for an
//! `LlmClient` and parses model output into `StructuredAction`s. Parsing is
//! tolerant of markdown fences and surrounding prose; a parse failure is
//! retried exactly once with a correction note, then reported as a protocol
//! error for the enclosing turn.

mod templates;

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::graph::ReasoningGraph;
use crate::llm::LlmClient;
use crate::message::Message;

/// Prompting style: the planner grows the graph, the searcher resolves one
/// sub-question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Planner,
    Searcher,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Planner => write!(f, "planner"),
            Role::Searcher => write!(f, "searcher"),
        }
    }
}

/// Prompt template locale.
///
/// Ja is the original consumer's default; En and Cn carry fully distinct
/// template sets. Dispatched by exhaustive match, never string comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    En,
    Cn,
    Ja,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" => Ok(Self::En),
            "cn" => Ok(Self::Cn),
            "ja" => Ok(Self::Ja),
            _ => Err(format!("unknown locale: {} (use en, cn, or ja)", s)),
        }
    }
}

/// One sub-question node proposed by the planner.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlannedNode {
    pub id: String,
    pub question: String,
}

/// Parsed model output.
///
/// Planner replies are `Expand` or `Finish`; searcher replies are `Search`
/// or `Answer`. `parse_response` rejects actions that do not belong to the
/// given role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredAction {
    /// Grow the graph with new sub-question nodes and edges.
    Expand {
        nodes: Vec<PlannedNode>,
        edges: Vec<(String, String)>,
    },
    /// Terminate the session with the final synthesized answer.
    Finish { response: String },
    /// Run these search queries for the current sub-question.
    Search { queries: Vec<String> },
    /// Answer the current sub-question directly.
    Answer { response: String },
}

/// Error parsing model output into a `StructuredAction`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    /// No JSON object found in the reply.
    #[error("no JSON object in model output")]
    NoJsonObject,
    /// The JSON did not match any known action shape.
    #[error("malformed action JSON: {0}")]
    Json(String),
    /// The action does not belong to this role (e.g. searcher sent "finish").
    #[error("action {action:?} not valid for role {role}")]
    WrongRole { role: Role, action: String },
}

/// Wire shape of a model reply; `action` selects the variant.
#[derive(Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum RawAction {
    Expand {
        #[serde(default)]
        nodes: Vec<PlannedNode>,
        #[serde(default)]
        edges: Vec<(String, String)>,
    },
    Finish {
        response: String,
    },
    Search {
        #[serde(default)]
        queries: Vec<String>,
    },
    Answer {
        response: String,
    },
}

/// Formats prompts per role and locale, and parses replies back.
///
/// Stateless apart from the locale and the date-stamped meta line captured at
/// construction; cheap to clone into the planner and searcher of a session.
#[derive(Debug, Clone)]
pub struct ProtocolAdapter {
    locale: Locale,
    meta: String,
}

impl ProtocolAdapter {
    /// Creates an adapter for the locale, stamping today's date into the
    /// meta line (like the original consumer does per session).
    pub fn new(locale: Locale) -> Self {
        let date = chrono::Local::now().format("%Y-%m-%d").to_string();
        Self::with_date(locale, &date)
    }

    /// Creates an adapter with an explicit date (deterministic tests).
    pub fn with_date(locale: Locale, date: &str) -> Self {
        Self {
            locale,
            meta: templates::meta_line(locale, date),
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Planner prompt: question plus the resolved sub-answers so far.
    pub fn format_planner_prompt(&self, question: &str, graph: &ReasoningGraph) -> Vec<Message> {
        let system = format!("{}\n\n{}", self.meta, templates::planner_system(self.locale));
        let mut user = format!("Question: {}", question);
        let resolved = graph.resolved_context();
        if !resolved.is_empty() {
            user.push_str("\n\nResolved sub-answers:");
            for (id, response) in resolved {
                user.push_str(&format!("\n- {}: {}", id, response));
            }
        }
        vec![Message::system(system), Message::user(user)]
    }

    /// Searcher prompt: one sub-question plus sibling answers for context.
    pub fn format_searcher_prompt(
        &self,
        sub_question: &str,
        graph: &ReasoningGraph,
    ) -> Vec<Message> {
        let system = format!("{}\n\n{}", self.meta, templates::searcher_system(self.locale));
        let mut user = format!("Sub-question: {}", sub_question);
        let resolved = graph.resolved_context();
        if !resolved.is_empty() {
            user.push_str("\n\nAlready answered:");
            for (id, response) in resolved {
                user.push_str(&format!("\n- {}: {}", id, response));
            }
        }
        vec![Message::system(system), Message::user(user)]
    }

    /// Reduce prompt: fold accumulated tool output into a node answer.
    /// The reply is plain text, not JSON.
    pub fn format_reduce_prompt(&self, sub_question: &str, tool_output: &str) -> Vec<Message> {
        let system = format!("{}\n\n{}", self.meta, templates::reduce_system(self.locale));
        let user = format!(
            "Sub-question: {}\n\nSearch results:\n{}",
            sub_question, tool_output
        );
        vec![Message::system(system), Message::user(user)]
    }

    /// Correction note appended on the single retry after a parse failure.
    pub fn correction_note(&self) -> Message {
        Message::user(templates::correction(self.locale))
    }

    /// Parses model output into a structured action for the role.
    ///
    /// Tolerates markdown code fences and prose around the JSON object:
    /// the outermost `{ ... }` span is extracted and parsed.
    pub fn parse_response(&self, role: Role, raw: &str) -> Result<StructuredAction, ParseError> {
        let json = extract_json_object(raw).ok_or(ParseError::NoJsonObject)?;
        let action: RawAction =
            serde_json::from_str(json).map_err(|e| ParseError::Json(e.to_string()))?;
        match (role, action) {
            (Role::Planner, RawAction::Expand { nodes, edges }) => {
                Ok(StructuredAction::Expand { nodes, edges })
            }
            (Role::Planner, RawAction::Finish { response }) => {
                Ok(StructuredAction::Finish { response })
            }
            (Role::Searcher, RawAction::Search { queries }) => {
                Ok(StructuredAction::Search { queries })
            }
            (Role::Searcher, RawAction::Answer { response }) => {
                Ok(StructuredAction::Answer { response })
            }
            (role, other) => Err(ParseError::WrongRole {
                role,
                action: raw_action_name(&other).to_string(),
            }),
        }
    }
}

fn raw_action_name(action: &RawAction) -> &'static str {
    match action {
        RawAction::Expand { .. } => "expand",
        RawAction::Finish { .. } => "finish",
        RawAction::Search { .. } => "search",
        RawAction::Answer { .. } => "answer",
    }
}

/// Returns the outermost `{ ... }` span of the input, if any.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Invokes the LLM and parses the reply, retrying exactly once on a parse
/// failure with the raw reply and a correction note appended.
///
/// A second parse failure (or any LLM transport error) is fatal for the turn:
/// parse failures surface as `SessionError::Protocol`.
///
/// **Interaction**: Shared by `Planner::next_action` and `Searcher::resolve`;
/// this is the only place the Retry-Once policy lives.
pub async fn invoke_structured(
    llm: &dyn LlmClient,
    adapter: &ProtocolAdapter,
    role: Role,
    messages: Vec<Message>,
) -> Result<StructuredAction, SessionError> {
    let raw = llm.invoke(&messages).await?;
    match adapter.parse_response(role, &raw) {
        Ok(action) => Ok(action),
        Err(first_err) => {
            warn!(%role, error = %first_err, "model output unparseable, retrying once");
            let mut retry = messages;
            retry.push(Message::assistant(raw));
            retry.push(adapter.correction_note());
            let raw = llm.invoke(&retry).await?;
            adapter.parse_response(role, &raw).map_err(|second_err| {
                debug!(%role, error = %second_err, "retry output unparseable");
                SessionError::Protocol(format!(
                    "{} output unparseable after retry: {}",
                    role, second_err
                ))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;

    fn adapter() -> ProtocolAdapter {
        ProtocolAdapter::with_date(Locale::En, "2026-01-01")
    }

    /// **Scenario**: locale parses from its string form and rejects unknowns.
    #[test]
    fn locale_from_str() {
        assert_eq!("en".parse::<Locale>().unwrap(), Locale::En);
        assert_eq!("CN".parse::<Locale>().unwrap(), Locale::Cn);
        assert_eq!("ja".parse::<Locale>().unwrap(), Locale::Ja);
        assert!("fr".parse::<Locale>().is_err());
    }

    /// **Scenario**: well-formed planner expand reply round-trips exactly.
    #[test]
    fn parse_planner_expand() {
        let raw = r#"{"action": "expand", "nodes": [{"id": "a", "question": "Q?"}], "edges": [["root", "a"]]}"#;
        let action = adapter().parse_response(Role::Planner, raw).unwrap();
        assert_eq!(
            action,
            StructuredAction::Expand {
                nodes: vec![PlannedNode {
                    id: "a".to_string(),
                    question: "Q?".to_string()
                }],
                edges: vec![("root".to_string(), "a".to_string())],
            }
        );
    }

    /// **Scenario**: finish reply round-trips; fenced JSON is tolerated.
    #[test]
    fn parse_planner_finish_fenced() {
        let raw = "```json\n{\"action\": \"finish\", \"response\": \"Paris\"}\n```";
        let action = adapter().parse_response(Role::Planner, raw).unwrap();
        assert_eq!(
            action,
            StructuredAction::Finish {
                response: "Paris".to_string()
            }
        );
    }

    /// **Scenario**: searcher search/answer replies round-trip for every locale.
    #[test]
    fn parse_searcher_actions_all_locales() {
        for locale in [Locale::En, Locale::Cn, Locale::Ja] {
            let adapter = ProtocolAdapter::with_date(locale, "2026-01-01");
            let action = adapter
                .parse_response(Role::Searcher, r#"{"action": "search", "queries": ["q1", "q2"]}"#)
                .unwrap();
            assert_eq!(
                action,
                StructuredAction::Search {
                    queries: vec!["q1".to_string(), "q2".to_string()]
                }
            );
            let action = adapter
                .parse_response(Role::Searcher, r#"{"action": "answer", "response": "A"}"#)
                .unwrap();
            assert_eq!(
                action,
                StructuredAction::Answer {
                    response: "A".to_string()
                }
            );
        }
    }

    /// **Scenario**: a planner action sent by the searcher (and vice versa)
    /// is rejected as WrongRole.
    #[test]
    fn parse_rejects_wrong_role() {
        let err = adapter()
            .parse_response(Role::Searcher, r#"{"action": "finish", "response": "x"}"#)
            .unwrap_err();
        assert!(matches!(err, ParseError::WrongRole { action, .. } if action == "finish"));
        let err = adapter()
            .parse_response(Role::Planner, r#"{"action": "search", "queries": []}"#)
            .unwrap_err();
        assert!(matches!(err, ParseError::WrongRole { action, .. } if action == "search"));
    }

    /// **Scenario**: prose without JSON and malformed JSON produce distinct errors.
    #[test]
    fn parse_failures() {
        assert!(matches!(
            adapter().parse_response(Role::Planner, "I think we should search."),
            Err(ParseError::NoJsonObject)
        ));
        assert!(matches!(
            adapter().parse_response(Role::Planner, r#"{"action": "explode"}"#),
            Err(ParseError::Json(_))
        ));
    }

    /// **Scenario**: planner prompt includes the date meta, the question, and
    /// resolved sub-answers.
    #[test]
    fn planner_prompt_contains_context() {
        let mut graph = ReasoningGraph::new();
        graph.add_root("capital?").unwrap();
        graph
            .add_node(crate::graph::ReasoningNode::search("a", "A?"))
            .unwrap();
        graph.resolve_node("a", "answer-a").unwrap();

        let messages = adapter().format_planner_prompt("capital?", &graph);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].content().contains("2026-01-01"));
        assert!(messages[1].content().contains("capital?"));
        assert!(messages[1].content().contains("a: answer-a"));
    }

    /// **Scenario**: reduce prompt carries the sub-question and tool output
    /// and asks for plain text.
    #[test]
    fn reduce_prompt_contains_tool_output() {
        let messages = adapter().format_reduce_prompt("Q?", "[1] hit one");
        assert!(messages[1].content().contains("Q?"));
        assert!(messages[1].content().contains("[1] hit one"));
    }

    /// **Scenario**: first reply malformed, retry parses; caller sees the
    /// parsed action and two LLM calls were consumed.
    #[tokio::test]
    async fn invoke_structured_retries_once() {
        let llm = MockLlm::scripted([
            "not json at all",
            r#"{"action": "finish", "response": "ok"}"#,
        ]);
        let action = invoke_structured(
            &llm,
            &adapter(),
            Role::Planner,
            vec![Message::user("q")],
        )
        .await
        .unwrap();
        assert_eq!(
            action,
            StructuredAction::Finish {
                response: "ok".to_string()
            }
        );
    }

    /// **Scenario**: two malformed replies in a row become a Protocol error.
    #[tokio::test]
    async fn invoke_structured_protocol_error_after_second_failure() {
        let llm = MockLlm::scripted(["garbage", "still garbage"]);
        let err = invoke_structured(
            &llm,
            &adapter(),
            Role::Planner,
            vec![Message::user("q")],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SessionError::Protocol(_)));
    }
}
