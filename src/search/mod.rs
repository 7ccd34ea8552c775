//! Full-text search infrastructure for the documentation corpus.
//!
//! This module provides tokenization, query sanitization and parsing, the
//! boosted inverted index, fuzzy suggestions, synonym lookup and
//! presentation-side ranking.

// Module declarations
pub mod fuzzy;
pub mod index;
pub mod query;
pub mod sanitize;
pub mod scoring;
pub mod synonyms;
pub mod tokenize;

// Public re-exports (used via lib.rs)
pub use fuzzy::{FuzzyMatcher, SearchDictionary, Suggestion};
pub use index::{Field, InvertedIndex, SearchHit};
pub use query::{Clause, Presence, parse_query};
pub use sanitize::{fallback_query, sanitize_query_for_search};
pub use synonyms::{SynonymTable, SynonymValue};
pub use tokenize::{Analyzer, Language, extract_words, normalize_keywords, parse_keywords};
