//! Presentation-side ranking: result re-ranking, module page hits, grouping
//! and content snippets.
//!
//! None of this changes what the orchestrator returns; it is applied on top
//! of index hits by callers that render results.

use super::index::SearchHit;
use crate::corpus::{EntryKind, EntryRef, SearchData};
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;

/// Snippets longer than this are cut at a word boundary.
const SNIPPET_MAX_CHARS: usize = 200;

/// Parameters whose content lists resource properties get a larger bump.
const RESOURCE_PROPERTY_MARKER: &str = "resources__prop_name";

const GLOBAL_MODULE_URL: &str = "/products/kubernetes-platform/documentation/v1/reference/api/global.html";

/// Calculate the boost for a title or parameter name match.
///
/// - 4.0: Exact match
/// - 3.5: Title contains query
/// - None: No match
pub fn name_relevance(name: &str, query: &str) -> Option<f64> {
    if name.is_empty() {
        None
    } else if name == query {
        Some(4.0)
    } else if name.contains(query) {
        Some(3.5)
    } else {
        None
    }
}

/// Content-aware multiplier for one entity, relative to a lowercased query.
pub fn rerank_boost(entry: EntryRef<'_>, query: &str) -> f64 {
    let mut boost = entry.index_boost().filter(|b| *b != 0.0).unwrap_or(1.0);

    let module = entry.module().to_lowercase();
    if !module.is_empty() && module.contains(query) {
        boost *= 1.8;
    }

    if let Some(name_boost) = name_relevance(&entry.title().to_lowercase(), query) {
        boost *= name_boost;
    }

    // Only plain-string keywords count here.
    if let Some(keywords) = entry.keywords().as_str()
        && !keywords.is_empty()
        && keywords.to_lowercase().contains(query)
    {
        boost *= 2.0;
    }

    let content = entry.content();
    if !content.is_empty() && content.to_lowercase().contains(query) {
        boost *= 1.2;
    }

    if entry.kind() == EntryKind::Parameter {
        boost *= if content.contains(RESOURCE_PROPERTY_MARKER) {
            1.5
        } else {
            1.2
        };
        if entry.is_resource() {
            boost *= 2.0;
        }
    }

    boost
}

/// Multiply every hit by its [`rerank_boost`] and re-sort, highest first.
///
/// Hits whose ref no longer resolves keep their score.
pub fn rerank(data: &SearchData, hits: Vec<SearchHit>, query: &str) -> Vec<SearchHit> {
    let query = query.to_lowercase();
    let mut boosted: Vec<SearchHit> = hits
        .into_iter()
        .map(|hit| match data.get(hit.reference) {
            Some(entry) => SearchHit {
                score: hit.score * rerank_boost(entry, &query),
                ..hit
            },
            None => hit,
        })
        .collect();

    boosted.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    boosted
}

/// Synthetic hit pointing at a module's landing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModulePageHit {
    #[serde(rename = "ref")]
    pub reference: String,
    pub score: f64,
    pub module: String,
    pub url: String,
}

/// Module pages whose name equals (score 1000) or contains (score 500) the
/// query, exact matches first.
pub fn module_page_results(modules: &[String], query: &str) -> Vec<ModulePageHit> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return vec![];
    }
    let mut results: Vec<ModulePageHit> = modules
        .iter()
        .filter_map(|module| {
            let lower = module.to_lowercase();
            let score = if lower == query {
                1000.0
            } else if lower.contains(&query) {
                500.0
            } else {
                return None;
            };
            Some(ModulePageHit {
                reference: format!("module_page_{module}"),
                score,
                module: module.clone(),
                url: module_url(module),
            })
        })
        .collect();

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    results
}

pub fn module_url(module: &str) -> String {
    if module == "global" {
        GLOBAL_MODULE_URL.to_string()
    } else {
        format!("/modules/{module}/")
    }
}

/// Results split into display groups, each keeping the incoming order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedResults {
    pub modules: Vec<ModulePageHit>,
    pub is_resource_name_match: Vec<SearchHit>,
    pub name_match: Vec<SearchHit>,
    pub is_resource_other: Vec<SearchHit>,
    pub parameter_other: Vec<SearchHit>,
    pub document: Vec<SearchHit>,
}

impl GroupedResults {
    pub fn len(&self) -> usize {
        self.modules.len()
            + self.is_resource_name_match.len()
            + self.name_match.len()
            + self.is_resource_other.len()
            + self.parameter_other.len()
            + self.document.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Group hits for display.
///
/// Parameters are split on whether they are resources and whether their name
/// contains the query; documents form one group. Unresolvable refs are dropped.
pub fn group_results(
    data: &SearchData,
    module_pages: Vec<ModulePageHit>,
    hits: &[SearchHit],
    query: &str,
) -> GroupedResults {
    let query = query.to_lowercase();
    let mut grouped = GroupedResults {
        modules: module_pages,
        ..GroupedResults::default()
    };

    for hit in hits {
        let Some(entry) = data.get(hit.reference) else {
            continue;
        };

        let group = match entry.kind() {
            EntryKind::Document => &mut grouped.document,
            EntryKind::Parameter => {
                let name = entry.title().to_lowercase();
                let name_match = !name.is_empty() && name.contains(&query);
                match (entry.is_resource(), name_match) {
                    (true, true) => &mut grouped.is_resource_name_match,
                    (true, false) => &mut grouped.is_resource_other,
                    (false, true) => &mut grouped.name_match,
                    (false, false) => &mut grouped.parameter_other,
                }
            }
        };
        group.push(hit.clone());
    }

    grouped
}

/// Pick the sentence of `content` that best represents `query`, highlighted.
///
/// Preference: the first sentence containing the whole query, then the
/// sentence matching the most query-word characters (words longer than two
/// characters), then the first sentence without highlighting.
pub fn content_snippet(content: &str, query: &str) -> String {
    let sentences: Vec<&str> = split_sentences(content);
    let query_lower = query.to_lowercase();

    if let Some(sentence) = sentences
        .iter()
        .find(|s| s.to_lowercase().contains(&query_lower))
    {
        return highlight_text(&truncate_text(sentence.trim(), SNIPPET_MAX_CHARS), query);
    }

    let words: Vec<&str> = query_lower
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .collect();
    let mut best: Option<(&str, usize)> = None;
    for sentence in sentences.iter().copied() {
        let lower = sentence.to_lowercase();
        let score: usize = words
            .iter()
            .filter(|w| lower.contains(*w))
            .map(|w| w.chars().count())
            .sum();
        if score > 0 && best.is_none_or(|(_, top)| score > top) {
            best = Some((sentence, score));
        }
    }
    if let Some((sentence, _)) = best {
        return highlight_text(&truncate_text(sentence.trim(), SNIPPET_MAX_CHARS), query);
    }

    sentences
        .first()
        .map(|s| truncate_text(s.trim(), SNIPPET_MAX_CHARS))
        .unwrap_or_default()
}

/// Wrap every case-insensitive occurrence of `query` in `<mark>` tags.
pub fn highlight_text(text: &str, query: &str) -> String {
    if text.is_empty() || query.is_empty() {
        return text.to_string();
    }
    match Regex::new(&format!("(?i){}", regex::escape(query))) {
        Ok(pattern) => pattern.replace_all(text, "<mark>$0</mark>").into_owned(),
        Err(_) => text.to_string(),
    }
}

fn split_sentences(content: &str) -> Vec<&str> {
    content
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .collect()
}

/// Cut `text` to `max_chars`, backing off to the last space, and append `...`.
fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut = text
        .char_indices()
        .nth(max_chars)
        .map_or(text.len(), |(i, _)| i);
    let mut truncated = &text[..cut];
    if let Some(space) = truncated.rfind(' ')
        && space > 0
    {
        truncated = &truncated[..space];
    }
    format!("{truncated}...")
}
