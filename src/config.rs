//! Engine tuning parameters and on-disk inputs for the CLI.

use crate::corpus::SearchData;
use crate::error::Result;
use crate::search::Field;
use crate::search::synonyms::{SynonymEntries, SynonymTable};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Relative weight of a match in each indexed field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldBoosts {
    pub title: f64,
    pub keywords: f64,
    pub module: f64,
    pub summary: f64,
    pub content: f64,
}

impl Default for FieldBoosts {
    fn default() -> Self {
        Self {
            title: 10.0,
            keywords: 8.0,
            module: 6.0,
            summary: 3.0,
            content: 1.0,
        }
    }
}

impl FieldBoosts {
    pub fn get(&self, field: Field) -> f64 {
        match field {
            Field::Title => self.title,
            Field::Keywords => self.keywords,
            Field::Module => self.module,
            Field::Summary => self.summary,
            Field::Content => self.content,
        }
    }
}

/// Tuning knobs for one engine instance. Every field has a default, so an
/// INIT payload may omit any of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchConfig {
    /// Disabling fuzzy matching skips both fuzzy fallback steps.
    pub fuzzy: bool,
    /// Maximum share of the query that may be edited for a fuzzy match.
    pub fuzzy_threshold: f64,
    /// Cyrillic fallback keeps candidates scoring strictly above this.
    pub cyrillic_similarity_floor: f64,
    /// Shortest query the fuzzy matcher considers, in characters.
    pub min_match_chars: usize,
    pub max_suggestions: usize,
    /// How many suggestions the per-word fuzzy step tries.
    pub fallback_candidates: usize,
    pub boosts: FieldBoosts,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fuzzy: true,
            fuzzy_threshold: 0.4,
            cyrillic_similarity_floor: 0.2,
            min_match_chars: 2,
            max_suggestions: 5,
            fallback_candidates: 3,
            boosts: FieldBoosts::default(),
        }
    }
}

/// Reads a corpus JSON file.
pub fn load_search_data(path: &Path) -> Result<SearchData> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus {}", path.display()))?;
    SearchData::from_json_str(&text)
        .with_context(|| format!("Failed to parse corpus {}", path.display()))
}

/// Reads a synonym table from a `.toml` file, or JSON otherwise.
pub fn load_synonyms(path: &Path) -> Result<SynonymTable> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read synonyms {}", path.display()))?;

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let entries: SynonymEntries = if is_toml {
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse TOML synonyms {}", path.display()))?
    } else {
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse JSON synonyms {}", path.display()))?
    };

    Ok(SynonymTable::new(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use std::io::Write;

    #[test]
    fn test_default_boost_order() {
        let boosts = FieldBoosts::default();
        let ordered: Vec<f64> = Field::ALL.iter().map(|f| boosts.get(*f)).collect();
        for pair in ordered.windows(2) {
            check!(pair[0] > pair[1]);
        }
    }

    #[test]
    fn test_partial_config_takes_defaults() {
        let config: SearchConfig =
            serde_json::from_str(r#"{"fuzzyThreshold": 0.25, "boosts": {"title": 20}}"#).unwrap();
        check!(config.fuzzy_threshold == 0.25);
        check!(config.boosts.title == 20.0);
        check!(config.boosts.keywords == 8.0);
        check!(config.max_suggestions == 5);
        check!(config.fuzzy);
    }

    #[test]
    fn test_load_synonyms_json_and_toml() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("synonyms.json");
        std::fs::write(&json_path, r#"{"k8s": "kubernetes", "lb": ["load balancer", "ingress"]}"#)
            .unwrap();
        let_assert!(Ok(table) = load_synonyms(&json_path));
        check!(table.candidates("K8S") == vec!["kubernetes"]);
        check!(table.candidates("lb") == vec!["load balancer", "ingress"]);

        let toml_path = dir.path().join("synonyms.toml");
        let mut file = std::fs::File::create(&toml_path).unwrap();
        writeln!(file, "k8s = \"kubernetes\"\n\"load balancer\" = [\"ingress\"]").unwrap();
        drop(file);
        let_assert!(Ok(table) = load_synonyms(&toml_path));
        check!(table.candidates("k8s") == vec!["kubernetes"]);
        check!(table.candidates("load   balancer") == vec!["ingress"]);
    }

    #[test]
    fn test_load_missing_corpus_reports_path() {
        let_assert!(Err(err) = load_search_data(Path::new("/nonexistent/search.json")));
        check!(format!("{:#}", err).contains("/nonexistent/search.json"));
    }
}
