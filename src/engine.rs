//! The search session: one corpus, its index and suggestion structures, and
//! the fallback chain that turns a raw query into results.

use crate::config::SearchConfig;
use crate::corpus::{EntryRef, IndexedEntry, Ref, SearchData};
use crate::error::{QueryParseError, SearchError};
use crate::search::scoring::{
    GroupedResults, content_snippet, group_results, module_page_results, rerank,
};
use crate::search::{
    FuzzyMatcher, InvertedIndex, Language, SearchDictionary, SearchHit, SynonymTable,
    fallback_query, sanitize_query_for_search,
};
use serde::Serialize;

/// Results of one query together with the string that produced them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub results: Vec<SearchHit>,
    /// The sanitized query, synonym or suggestion the results came from.
    pub highlight_query: String,
}

/// Re-ranked, grouped results for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedOutcome {
    pub groups: GroupedResults,
    pub highlight_query: String,
}

/// Everything built from one INIT, owned together.
#[derive(Debug)]
pub struct SearchEngine {
    corpus: SearchData,
    index: InvertedIndex,
    /// `None` when fuzzy matching is disabled; both fuzzy steps are skipped.
    fuzzy: Option<FuzzyMatcher>,
    synonyms: SynonymTable,
    available_modules: Vec<String>,
    config: SearchConfig,
}

impl SearchEngine {
    /// Build the index, dictionary and module list for a corpus.
    pub fn build(
        corpus: SearchData,
        language: Language,
        synonyms: SynonymTable,
        config: SearchConfig,
    ) -> Self {
        let start = std::time::Instant::now();

        let entries: Vec<IndexedEntry> = corpus
            .entries()
            .map(|(reference, entry)| entry.to_indexed(reference))
            .collect();
        let index = InvertedIndex::build(&entries, language, config.boosts);

        let fuzzy = config
            .fuzzy
            .then(|| FuzzyMatcher::new(SearchDictionary::build(&corpus), &config));
        let available_modules = corpus.available_modules();

        tracing::info!(
            "Search engine ready: {} documents, {} parameters, {} modules, {} synonyms ({:?}) in {:?}",
            corpus.documents.len(),
            corpus.parameters.len(),
            available_modules.len(),
            synonyms.len(),
            language,
            start.elapsed()
        );

        Self {
            corpus,
            index,
            fuzzy,
            synonyms,
            available_modules,
            config,
        }
    }

    pub fn corpus(&self) -> &SearchData {
        &self.corpus
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Distinct module names, in order of first appearance in the corpus.
    pub fn available_modules(&self) -> &[String] {
        &self.available_modules
    }

    /// The corpus entity behind a hit.
    pub fn resolve(&self, reference: Ref) -> Option<EntryRef<'_>> {
        self.corpus.get(reference)
    }

    /// Answer a raw user query.
    ///
    /// Runs the sanitized query, then each synonym, then the best fuzzy
    /// suggestion, then the top few suggestions, stopping at the first step
    /// that yields results. Empty results are a valid outcome; only a query the
    /// index cannot parse even after cleanup is an error.
    pub fn search(&self, query: &str) -> Result<SearchOutcome, SearchError> {
        let sanitized = sanitize_query_for_search(query);
        self.search_sanitized(&sanitized)
    }

    fn search_sanitized(&self, sanitized: &str) -> Result<SearchOutcome, SearchError> {
        let (mut results, mut highlight_query) = self.query_index(sanitized)?;

        if results.is_empty() {
            for candidate in self.synonyms.candidates(sanitized) {
                match self.query_index(&candidate) {
                    Ok((hits, used)) if !hits.is_empty() => {
                        tracing::debug!("Synonym '{}' matched {} results", used, hits.len());
                        results = hits;
                        highlight_query = used;
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Skipping synonym '{}': {}", candidate, e),
                }
            }
        }

        if results.is_empty()
            && let Some(fuzzy) = &self.fuzzy
        {
            let suggestions = fuzzy.suggestions(sanitized);

            // The best suggestion is adopted even when it finds nothing.
            if let Some(best) = suggestions.first() {
                match self.query_index(&best.term) {
                    Ok((hits, used)) => {
                        tracing::debug!(
                            "Fuzzy suggestion '{}' for '{}' matched {} results",
                            used,
                            sanitized,
                            hits.len()
                        );
                        results = hits;
                        highlight_query = used;
                    }
                    Err(e) => tracing::warn!("Skipping suggestion '{}': {}", best.term, e),
                }
            }

            if results.is_empty() {
                for suggestion in suggestions.iter().take(self.config.fallback_candidates) {
                    match self.query_index(&suggestion.term) {
                        Ok((hits, used)) if !hits.is_empty() => {
                            results = hits;
                            highlight_query = used;
                            break;
                        }
                        Ok(_) => {}
                        Err(e) => tracing::warn!("Skipping suggestion '{}': {}", suggestion.term, e),
                    }
                }
            }
        }

        if results.is_empty() {
            tracing::debug!("No results for '{}'", sanitized);
        }

        Ok(SearchOutcome {
            results,
            highlight_query,
        })
    }

    /// Query the index, retrying once with symbols stripped if it fails to
    /// parse. Returns the hits and the query string that produced them.
    fn query_index(&self, query: &str) -> Result<(Vec<SearchHit>, String), QueryParseError> {
        match self.index.search(query) {
            Ok(hits) => Ok((hits, query.to_string())),
            Err(e) => {
                let cleaned = fallback_query(query);
                if cleaned == query {
                    return Err(e);
                }
                tracing::debug!("Query '{}' rejected ({}), retrying as '{}'", query, e, cleaned);
                let hits = self.index.search(&cleaned)?;
                Ok((hits, cleaned))
            }
        }
    }

    /// [`SearchEngine::search`] followed by re-ranking, module page hits and
    /// grouping for display.
    ///
    /// Re-ranking and module pages use the sanitized query; grouping matches
    /// parameter names against the query as typed.
    pub fn search_ranked(&self, query: &str) -> Result<RankedOutcome, SearchError> {
        let sanitized = sanitize_query_for_search(query);
        let outcome = self.search_sanitized(&sanitized)?;

        let hits = rerank(&self.corpus, outcome.results, &sanitized);
        let pages = module_page_results(&self.available_modules, &sanitized);

        Ok(RankedOutcome {
            groups: group_results(&self.corpus, pages, &hits, query),
            highlight_query: outcome.highlight_query,
        })
    }

    /// Highlighted content excerpt for a hit. `None` if the ref is unknown.
    pub fn snippet(&self, reference: Ref, highlight_query: &str) -> Option<String> {
        self.resolve(reference)
            .map(|entry| content_snippet(entry.content(), highlight_query))
    }
}
