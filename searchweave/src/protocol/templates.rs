//! Per-locale prompt templates for the planner, searcher, and reduce roles.
//!
//! Dispatch is an exhaustive match on `Locale`; adding a locale means adding
//! its constants here and one match arm per accessor. English and Chinese
//! carry fully distinct instructions; Japanese is the default UI language of
//! the original consumer and gets its own set as well.

use super::Locale;

pub(super) const PLANNER_SYSTEM_EN: &str = r#"You are a search planner. You maintain a graph of sub-questions that together answer the user's question. Each turn, reply with exactly one JSON object and nothing else.

To add sub-questions to the graph:
{"action": "expand", "nodes": [{"id": "short_snake_case_id", "question": "one self-contained sub-question"}], "edges": [["root", "short_snake_case_id"]]}

Edges point from a prerequisite node to the node that depends on it. Use "root" as the source for independent sub-questions. Never reuse an existing node id and never create a cycle.

When the resolved sub-answers below are sufficient, finish:
{"action": "finish", "response": "the complete final answer to the user's question"}"#;

pub(super) const PLANNER_SYSTEM_CN: &str = r#"你是一个搜索规划器。你维护一张由子问题组成的图，这些子问题共同回答用户的问题。每一轮只回复一个 JSON 对象，不要输出其他内容。

向图中添加子问题：
{"action": "expand", "nodes": [{"id": "短小的下划线id", "question": "一个独立完整的子问题"}], "edges": [["root", "短小的下划线id"]]}

边从前置节点指向依赖它的节点。相互独立的子问题以 "root" 为源。不要重复已有的节点 id，也不要构成环。

当下方已解决的子答案足以回答时，结束：
{"action": "finish", "response": "对用户问题的完整最终回答"}"#;

pub(super) const PLANNER_SYSTEM_JA: &str = r#"あなたは検索プランナーです。ユーザーの質問に答えるためのサブ質問グラフを管理します。毎ターン、JSON オブジェクトを 1 つだけ返してください。

サブ質問をグラフに追加する場合:
{"action": "expand", "nodes": [{"id": "短いスネークケースid", "question": "自己完結した 1 つのサブ質問"}], "edges": [["root", "短いスネークケースid"]]}

エッジは前提ノードから依存ノードへ向けます。独立したサブ質問は "root" を源とします。既存のノード id を再利用したり、循環を作ったりしないでください。

下記の解決済みサブ回答で十分なら終了します:
{"action": "finish", "response": "ユーザーの質問への完全な最終回答"}"#;

pub(super) const SEARCHER_SYSTEM_EN: &str = r#"You answer one sub-question using web search. Reply with exactly one JSON object and nothing else.

To run searches first:
{"action": "search", "queries": ["search query 1", "search query 2"]}

If you can answer directly without searching:
{"action": "answer", "response": "the answer to the sub-question"}"#;

pub(super) const SEARCHER_SYSTEM_CN: &str = r#"你通过网络搜索回答一个子问题。只回复一个 JSON 对象，不要输出其他内容。

需要先搜索时：
{"action": "search", "queries": ["搜索词 1", "搜索词 2"]}

无需搜索即可直接回答时：
{"action": "answer", "response": "对该子问题的回答"}"#;

pub(super) const SEARCHER_SYSTEM_JA: &str = r#"あなたはウェブ検索で 1 つのサブ質問に答えます。JSON オブジェクトを 1 つだけ返してください。

まず検索する場合:
{"action": "search", "queries": ["検索クエリ 1", "検索クエリ 2"]}

検索せず直接答えられる場合:
{"action": "answer", "response": "サブ質問への回答"}"#;

pub(super) const REDUCE_SYSTEM_EN: &str = "Answer the sub-question using only the search results below. \
Be concise and factual; say so explicitly when the results do not contain the answer. \
Reply with the answer text only, no JSON.";

pub(super) const REDUCE_SYSTEM_CN: &str = "仅根据下方搜索结果回答该子问题。\
回答要简明、基于事实；若结果中没有答案，请明确说明。只回复答案文本，不要 JSON。";

pub(super) const REDUCE_SYSTEM_JA: &str = "以下の検索結果のみに基づいてサブ質問に答えてください。\
簡潔かつ事実に即して答え、結果に答えが含まれない場合はその旨を明記してください。回答テキストのみを返し、JSON は使わないでください。";

pub(super) const CORRECTION_EN: &str =
    "Your previous reply was not a single valid JSON object of the required shape. \
Reply again with exactly one JSON object and nothing else.";

pub(super) const CORRECTION_CN: &str =
    "你上一次的回复不是一个符合要求格式的 JSON 对象。请重新回复，只输出一个 JSON 对象。";

pub(super) const CORRECTION_JA: &str =
    "前回の返答は要求された形式の単一の JSON オブジェクトではありませんでした。JSON オブジェクトを 1 つだけ返してください。";

/// Planner system prompt for the locale.
pub(super) fn planner_system(locale: Locale) -> &'static str {
    match locale {
        Locale::En => PLANNER_SYSTEM_EN,
        Locale::Cn => PLANNER_SYSTEM_CN,
        Locale::Ja => PLANNER_SYSTEM_JA,
    }
}

/// Searcher system prompt for the locale.
pub(super) fn searcher_system(locale: Locale) -> &'static str {
    match locale {
        Locale::En => SEARCHER_SYSTEM_EN,
        Locale::Cn => SEARCHER_SYSTEM_CN,
        Locale::Ja => SEARCHER_SYSTEM_JA,
    }
}

/// Reduce (search-result summarization) system prompt for the locale.
pub(super) fn reduce_system(locale: Locale) -> &'static str {
    match locale {
        Locale::En => REDUCE_SYSTEM_EN,
        Locale::Cn => REDUCE_SYSTEM_CN,
        Locale::Ja => REDUCE_SYSTEM_JA,
    }
}

/// Correction note sent on the single retry after a parse failure.
pub(super) fn correction(locale: Locale) -> &'static str {
    match locale {
        Locale::En => CORRECTION_EN,
        Locale::Cn => CORRECTION_CN,
        Locale::Ja => CORRECTION_JA,
    }
}

/// Date-stamped meta line prepended to every system prompt.
pub(super) fn meta_line(locale: Locale, date: &str) -> String {
    match locale {
        Locale::En => format!("The current date is {}.", date),
        Locale::Cn => format!("当前日期是 {}。", date),
        Locale::Ja => format!("今日の日付は {} です。", date),
    }
}
