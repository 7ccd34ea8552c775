//! Static synonym table consulted when a query has no direct matches.

use super::sanitize::sanitize_query_for_search;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A synonym entry maps to one alternative query or several, in priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SynonymValue {
    One(String),
    Many(Vec<String>),
}

/// Synonym table in its configuration-file shape. Ordered, so that keys which
/// normalize to the same phrase merge deterministically.
pub type SynonymEntries = BTreeMap<String, SynonymValue>;

/// Lookup table from a normalized phrase to alternative queries.
#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    entries: AHashMap<String, Vec<String>>,
}

impl SynonymTable {
    /// Builds the table, normalizing keys the same way queries are normalized.
    ///
    /// Keys that collide after normalization have their alternatives merged
    /// in key order, duplicates dropped.
    pub fn new(entries: SynonymEntries) -> Self {
        let mut merged: AHashMap<String, Vec<String>> = AHashMap::new();

        for (phrase, value) in entries {
            let alternatives = match value {
                SynonymValue::One(alternative) => vec![alternative],
                SynonymValue::Many(alternatives) => alternatives,
            };

            let key = normalize_phrase(&phrase);
            if let Some(existing) = merged.get_mut(&key) {
                tracing::warn!("Synonym key '{}' duplicates '{}', merging", phrase, key);
                for alternative in alternatives {
                    if !existing.contains(&alternative) {
                        existing.push(alternative);
                    }
                }
            } else {
                merged.insert(key, alternatives);
            }
        }

        Self { entries: merged }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Alternative queries for a whole query string, in table order.
    ///
    /// Matching is exact on the normalized phrase; there is no per-word or
    /// substring lookup. Candidates are sanitized, and any that equal the
    /// normalized query itself are dropped.
    pub fn candidates(&self, query: &str) -> Vec<String> {
        let normalized = normalize_phrase(query);
        let Some(alternatives) = self.entries.get(&normalized) else {
            return vec![];
        };

        alternatives
            .iter()
            .map(|alternative| sanitize_query_for_search(alternative).trim().to_string())
            .filter(|candidate| !candidate.is_empty() && *candidate != normalized)
            .collect()
    }
}

/// Lowercases, collapses whitespace runs and trims.
pub fn normalize_phrase(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
