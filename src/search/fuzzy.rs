//! Term dictionary and typo-tolerant suggestion matching.
//!
//! The dictionary is never used for ranking, only to turn a misspelled query
//! into a known term the index can answer.

use super::tokenize::{contains_cyrillic, extract_words, parse_keywords};
use crate::config::SearchConfig;
use crate::corpus::SearchData;
use ahash::AHashSet;
use rapidfuzz::distance::levenshtein;
use std::cmp::Ordering;

/// Deduplicated, case-insensitively sorted words from the descriptive fields
/// of every entity: title/name, keywords, module, summary and resource name.
#[derive(Debug, Clone, Default)]
pub struct SearchDictionary {
    terms: Vec<String>,
}

impl SearchDictionary {
    pub fn build(data: &SearchData) -> Self {
        let start = std::time::Instant::now();
        let mut words: AHashSet<String> = AHashSet::new();

        for (_, entry) in data.entries() {
            words.extend(extract_words(entry.title()));
            for keyword in parse_keywords(entry.keywords()) {
                words.extend(extract_words(&keyword));
            }
            words.extend(extract_words(entry.module()));
            words.extend(extract_words(entry.summary()));
            words.extend(extract_words(entry.res_name()));
        }

        let mut terms: Vec<String> = words.into_iter().collect();
        terms.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));

        tracing::debug!(
            "Built search dictionary: {} terms in {:?}",
            terms.len(),
            start.elapsed()
        );

        Self { terms }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.iter().any(|t| t == term)
    }
}

/// A dictionary term proposed for a query, with similarity in `[0, 1]`
/// (higher is closer).
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub term: String,
    pub score: f64,
}

/// Approximate matcher over a [`SearchDictionary`].
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    dictionary: SearchDictionary,
    threshold: f64,
    cyrillic_floor: f64,
    min_match_chars: usize,
    max_suggestions: usize,
}

impl FuzzyMatcher {
    pub fn new(dictionary: SearchDictionary, config: &SearchConfig) -> Self {
        Self {
            dictionary,
            threshold: config.fuzzy_threshold,
            cyrillic_floor: config.cyrillic_similarity_floor,
            min_match_chars: config.min_match_chars,
            max_suggestions: config.max_suggestions,
        }
    }

    pub fn dictionary(&self) -> &SearchDictionary {
        &self.dictionary
    }

    /// Best dictionary terms for a query, closest first, capped at the
    /// configured maximum.
    ///
    /// Matching is location-independent: the query may align with any part of
    /// a term, and is accepted when the edits needed stay within the threshold
    /// share of the query length. Cyrillic queries with no such match fall back
    /// to [`FuzzyMatcher::cyrillic_suggestions`].
    pub fn suggestions(&self, query: &str) -> Vec<Suggestion> {
        let query = query.trim().to_lowercase();
        if query.chars().count() < self.min_match_chars {
            return vec![];
        }

        let pattern: Vec<char> = query.chars().collect();
        let mut ranked: Vec<(f64, usize, usize)> = self
            .dictionary
            .terms
            .iter()
            .enumerate()
            .filter_map(|(position, term)| {
                let term_chars: Vec<char> = term.to_lowercase().chars().collect();
                let edits = substring_edit_distance(&pattern, &term_chars);
                let ratio = edits as f64 / pattern.len() as f64;
                let length_gap = term_chars.len().abs_diff(pattern.len());
                (ratio <= self.threshold).then_some((ratio, length_gap, position))
            })
            .collect();

        ranked.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
                .then(a.2.cmp(&b.2))
        });

        let mut suggestions: Vec<Suggestion> = ranked
            .into_iter()
            .map(|(ratio, _, position)| Suggestion {
                term: self.dictionary.terms[position].clone(),
                score: 1.0 - ratio,
            })
            .collect();

        if suggestions.is_empty() && contains_cyrillic(&query) {
            tracing::debug!("No fuzzy match for Cyrillic query '{}', comparing directly", query);
            suggestions = self.cyrillic_suggestions(&query);
        }

        suggestions.truncate(self.max_suggestions);
        suggestions
    }

    /// Direct comparison against Cyrillic dictionary terms.
    ///
    /// Scores: 1.0 equal, 0.8 term contains query, 0.7 query contains term,
    /// otherwise normalized Levenshtein similarity. Only scores above the
    /// configured floor are kept, best first.
    pub fn cyrillic_suggestions(&self, query: &str) -> Vec<Suggestion> {
        let query = query.to_lowercase();
        let mut suggestions: Vec<Suggestion> = self
            .dictionary
            .terms
            .iter()
            .filter(|term| contains_cyrillic(term))
            .filter_map(|term| {
                let score = cyrillic_similarity(&query, &term.to_lowercase());
                (score > self.cyrillic_floor).then(|| Suggestion {
                    term: term.clone(),
                    score,
                })
            })
            .collect();

        suggestions.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        suggestions
    }
}

/// Similarity used by the Cyrillic fallback. Exact and substring matches always
/// outrank pure edit-distance similarity.
pub(crate) fn cyrillic_similarity(query: &str, term: &str) -> f64 {
    if term == query {
        1.0
    } else if term.contains(query) {
        0.8
    } else if query.contains(term) {
        0.7
    } else {
        levenshtein::normalized_similarity(query.chars(), term.chars())
    }
}

/// Fewest edits turning `pattern` into some substring of `text`.
fn substring_edit_distance(pattern: &[char], text: &[char]) -> usize {
    // Row over text positions; a match may start anywhere in `text` for free.
    let mut previous: Vec<usize> = vec![0; text.len() + 1];
    let mut current: Vec<usize> = vec![0; text.len() + 1];

    for (i, &p) in pattern.iter().enumerate() {
        current[0] = i + 1;
        for (j, &t) in text.iter().enumerate() {
            let substitution = previous[j] + usize::from(p != t);
            let insertion = previous[j + 1] + 1;
            let deletion = current[j] + 1;
            current[j + 1] = substitution.min(insertion).min(deletion);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous.into_iter().min().unwrap_or(pattern.len())
}
