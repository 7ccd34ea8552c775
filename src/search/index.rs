//! Multi-field BM25 inverted index with per-field boosts.

use super::query::{Clause, Presence, parse_query};
use super::tokenize::{Analyzer, Language};
use crate::config::FieldBoosts;
use crate::corpus::{IndexedEntry, Ref};
use crate::error::QueryParseError;
use ahash::{AHashMap, AHashSet};
use rapidfuzz::distance::levenshtein;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// BM25 term-frequency saturation.
const BM25_K1: f64 = 1.2;
/// BM25 field-length normalization.
const BM25_B: f64 = 0.75;

const FIELD_COUNT: usize = 5;

/// An indexed text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Keywords,
    Module,
    Summary,
    Content,
}

impl Field {
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::Title,
        Field::Keywords,
        Field::Module,
        Field::Summary,
        Field::Content,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Keywords => "keywords",
            Self::Module => "module",
            Self::Summary => "summary",
            Self::Content => "content",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl FromStr for Field {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|f| f.name() == s).ok_or(())
    }
}

/// A ranked index match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "ref")]
    pub reference: Ref,
    pub score: f64,
}

/// One occurrence record: a term appears `tf` times in `field` of `doc`.
#[derive(Debug, Clone, Copy)]
struct Posting {
    doc: u32,
    field: Field,
    tf: u32,
}

/// Accumulates postings before the index is frozen.
pub(crate) struct IndexBuilder {
    analyzer: Analyzer,
    boosts: FieldBoosts,
    postings: AHashMap<String, Vec<Posting>>,
    field_lengths: Vec<[u32; FIELD_COUNT]>,
    refs: Vec<Ref>,
}

impl IndexBuilder {
    pub(crate) fn new(language: Language, boosts: FieldBoosts) -> Self {
        Self {
            analyzer: Analyzer::new(language),
            boosts,
            postings: AHashMap::new(),
            field_lengths: vec![],
            refs: vec![],
        }
    }

    /// Adds one entity. Refs must be unique; the caller assigns them.
    pub(crate) fn add(&mut self, entry: &IndexedEntry) {
        let doc = self.refs.len() as u32;
        self.refs.push(entry.reference);
        self.field_lengths.push([0; FIELD_COUNT]);

        self.add_field(doc, Field::Title, &entry.title);
        self.add_field(doc, Field::Keywords, &entry.keywords);
        self.add_field(doc, Field::Module, &entry.module);
        if self.analyzer.language() == Language::Cyrillic
            && let Some(moduletype) = &entry.moduletype
        {
            self.add_field(doc, Field::Module, moduletype);
        }
        self.add_field(doc, Field::Summary, &entry.summary);
        self.add_field(doc, Field::Content, &entry.content);
    }

    fn add_field(&mut self, doc: u32, field: Field, text: &str) {
        let tokens = self.analyzer.tokenize(text);
        if tokens.is_empty() {
            return;
        }
        self.field_lengths[doc as usize][field.slot()] += tokens.len() as u32;

        let mut counts: AHashMap<String, u32> = AHashMap::with_capacity(tokens.len());
        for token in tokens {
            *counts.entry(token).or_insert(0) += 1;
        }

        for (term, tf) in counts {
            let postings = self.postings.entry(term).or_default();
            match postings
                .iter_mut()
                .find(|p| p.doc == doc && p.field == field)
            {
                Some(existing) => existing.tf += tf,
                None => postings.push(Posting { doc, field, tf }),
            }
        }
    }

    /// Computes collection statistics and produces the searchable index.
    pub(crate) fn finalize(self) -> InvertedIndex {
        let start = std::time::Instant::now();
        let doc_count = self.refs.len();

        let mut avg_field_length = [0.0; FIELD_COUNT];
        if doc_count > 0 {
            for lengths in &self.field_lengths {
                for (slot, length) in lengths.iter().enumerate() {
                    avg_field_length[slot] += *length as f64;
                }
            }
            for avg in &mut avg_field_length {
                *avg /= doc_count as f64;
            }
        }

        let mut vocabulary: Vec<String> = self.postings.keys().cloned().collect();
        vocabulary.sort_unstable();

        let total_postings: usize = self.postings.values().map(Vec::len).sum();
        let index = InvertedIndex {
            analyzer: self.analyzer,
            boosts: self.boosts,
            postings: self.postings,
            vocabulary,
            field_lengths: self.field_lengths,
            avg_field_length,
            refs: self.refs,
        };

        tracing::info!(
            "Built search index: {} unique terms, {} entries, {} postings in {:?}",
            index.term_count(),
            index.document_count(),
            total_postings,
            start.elapsed()
        );

        index
    }
}

/// A searchable, boosted, multi-field index over the corpus.
#[derive(Debug)]
pub struct InvertedIndex {
    analyzer: Analyzer,
    boosts: FieldBoosts,
    postings: AHashMap<String, Vec<Posting>>,
    /// Sorted index terms, for wildcard and edit-distance expansion.
    vocabulary: Vec<String>,
    field_lengths: Vec<[u32; FIELD_COUNT]>,
    avg_field_length: [f64; FIELD_COUNT],
    refs: Vec<Ref>,
}

impl InvertedIndex {
    /// Builds an index over the given entities.
    pub fn build<'a>(
        entries: impl IntoIterator<Item = &'a IndexedEntry>,
        language: Language,
        boosts: FieldBoosts,
    ) -> Self {
        let mut builder = IndexBuilder::new(language, boosts);
        for entry in entries {
            builder.add(entry);
        }
        builder.finalize()
    }

    pub fn language(&self) -> Language {
        self.analyzer.language()
    }

    /// Get the number of unique terms in the index
    pub fn term_count(&self) -> usize {
        self.vocabulary.len()
    }

    /// Get the number of entities in the index
    pub fn document_count(&self) -> usize {
        self.refs.len()
    }

    /// Runs a query and returns matches sorted by descending score.
    ///
    /// Terms are OR-ed; `+term` is required and `-term` excludes. A query of
    /// only prohibited terms matches everything else with a zero score.
    pub fn search(&self, query: &str) -> Result<Vec<SearchHit>, QueryParseError> {
        let clauses = parse_query(query)?;

        let mut scores: AHashMap<u32, f64> = AHashMap::new();
        let mut required: Vec<AHashSet<u32>> = vec![];
        let mut prohibited: AHashSet<u32> = AHashSet::new();
        let mut has_positive_clause = false;

        for clause in &clauses {
            let mut matched: AHashSet<u32> = AHashSet::new();

            for (term, weight) in self.expand(clause) {
                let Some(postings) = self.postings.get(&term) else {
                    continue;
                };
                let idf = self.idf(postings);

                for posting in postings {
                    if clause.field.is_some_and(|field| field != posting.field) {
                        continue;
                    }
                    matched.insert(posting.doc);
                    if clause.presence != Presence::Prohibited {
                        let score = idf
                            * self.term_frequency_score(posting)
                            * self.boosts.get(posting.field)
                            * clause.boost
                            * weight;
                        *scores.entry(posting.doc).or_insert(0.0) += score;
                    }
                }
            }

            match clause.presence {
                Presence::Optional => has_positive_clause = true,
                Presence::Required => {
                    has_positive_clause = true;
                    required.push(matched);
                }
                Presence::Prohibited => prohibited.extend(matched),
            }
        }

        let candidates: Vec<(u32, f64)> = if has_positive_clause {
            scores.into_iter().collect()
        } else if clauses.is_empty() {
            vec![]
        } else {
            (0..self.refs.len() as u32).map(|doc| (doc, 0.0)).collect()
        };

        let mut results: Vec<(u32, f64)> = candidates
            .into_iter()
            .filter(|(doc, _)| !prohibited.contains(doc))
            .filter(|(doc, _)| required.iter().all(|set| set.contains(doc)))
            .collect();

        // Highest score first, corpus order on ties
        results.sort_by(|(a_doc, a), (b_doc, b)| b.total_cmp(a).then(a_doc.cmp(b_doc)));

        Ok(results
            .into_iter()
            .map(|(doc, score)| SearchHit {
                reference: self.refs[doc as usize],
                score,
            })
            .collect())
    }

    /// Index terms a clause stands for, each with a weight in (0, 1].
    fn expand(&self, clause: &Clause) -> Vec<(String, f64)> {
        if clause.has_wildcard() {
            let pattern = clause.term.to_lowercase();
            return self
                .vocabulary
                .iter()
                .filter(|term| wildcard_matches(&pattern, term))
                .map(|term| (term.clone(), 1.0))
                .collect();
        }

        let Some(term) = self.analyzer.analyze_term(&clause.term) else {
            return vec![];
        };

        if clause.edit_distance == 0 {
            return vec![(term, 1.0)];
        }

        let max_distance = clause.edit_distance as usize;
        self.vocabulary
            .iter()
            .filter_map(|candidate| {
                let distance = levenshtein::distance(term.chars(), candidate.chars());
                (distance <= max_distance)
                    .then(|| (candidate.clone(), 1.0 / (1.0 + distance as f64)))
            })
            .collect()
    }

    /// Okapi BM25 inverse document frequency.
    fn idf(&self, postings: &[Posting]) -> f64 {
        let docs_with_term = postings
            .iter()
            .map(|p| p.doc)
            .collect::<AHashSet<_>>()
            .len() as f64;
        let total = self.refs.len() as f64;
        (1.0 + ((total - docs_with_term + 0.5) / (docs_with_term + 0.5)).abs()).ln()
    }

    /// BM25 term-frequency component, normalized by field length.
    fn term_frequency_score(&self, posting: &Posting) -> f64 {
        let slot = posting.field.slot();
        let tf = posting.tf as f64;
        let length = self.field_lengths[posting.doc as usize][slot] as f64;
        let avg = self.avg_field_length[slot];
        let relative_length = if avg > 0.0 { length / avg } else { 1.0 };
        tf * (BM25_K1 + 1.0) / (tf + BM25_K1 * (1.0 - BM25_B + BM25_B * relative_length))
    }
}

/// Glob-style match where `*` spans any run of characters.
fn wildcard_matches(pattern: &str, term: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let term: Vec<char> = term.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < term.len() {
        if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, t));
            p += 1;
        } else if p < pattern.len() && pattern[p] == term[t] {
            p += 1;
            t += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            t = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
