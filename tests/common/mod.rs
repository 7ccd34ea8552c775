//! Shared test fixtures and utilities for integration tests.
//!
//! # Available Fixtures
//!
//! - `scenario_corpus`: one ingress-nginx page, the canonical smoke corpus
//! - `mixed_corpus`: pages and parameters across several modules
//! - `scenario_engine` / `mixed_engine`: engines built over those corpora
//!
//! [`TempCorpus`] writes corpus and synonym files for tests that go through
//! the file loaders.

use docsearch::search::SynonymValue;
use docsearch::{Language, SearchConfig, SearchData, SearchEngine, SynonymTable};
use rstest::fixture;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[allow(dead_code)]
pub fn scenario_json() -> Value {
    json!({
        "documents": [{
            "title": "Ingress Nginx Controller",
            "keywords": "ingress,nginx",
            "module": "ingress-nginx",
            "summary": "Routes traffic",
            "content": "The ingress-nginx module configures ingress controllers.",
            "url": "/modules/ingress-nginx/"
        }],
        "parameters": []
    })
}

#[allow(dead_code)] // Used by some integration test crates only
pub fn mixed_json() -> Value {
    json!({
        "documents": [
            {"title": "Cilium networking", "keywords": ["cni", "ebpf"], "module": "cni-cilium",
             "summary": "eBPF based networking", "content": "Cilium replaces kube-proxy.",
             "url": "/modules/cni-cilium/"},
            {"title": "Container runtime", "keywords": "containerd, cri", "module": "node-manager",
             "summary": "How nodes run containers", "content": "Nodes use containerd by default.",
             "url": "/modules/node-manager/cri.html"},
            {"title": "Widget gallery", "keywords": "", "module": "",
             "summary": "", "content": "Widgets everywhere.", "url": "/widgets.html"}
        ],
        "parameters": [
            {"name": "bpfLBMode", "keywords": "loadbalancer", "module": "cni-cilium",
             "resName": "ModuleConfig", "content": "Load balancing mode.",
             "url": "/modules/cni-cilium/configuration.html#bpflbmode"},
            {"name": "NodeGroup", "keywords": "", "module": "node-manager",
             "resName": "NodeGroup", "isResource": "true",
             "content": "resources__prop_name spec nodeType", "url": "/modules/node-manager/cr.html"}
        ]
    })
}

#[allow(dead_code)]
#[fixture]
pub fn scenario_corpus() -> SearchData {
    SearchData::from_value(scenario_json()).expect("scenario corpus is valid")
}

#[allow(dead_code)]
#[fixture]
pub fn scenario_engine(scenario_corpus: SearchData) -> SearchEngine {
    SearchEngine::build(
        scenario_corpus,
        Language::Latin,
        SynonymTable::default(),
        SearchConfig::default(),
    )
}

#[allow(dead_code)]
#[fixture]
pub fn mixed_engine() -> SearchEngine {
    let corpus = SearchData::from_value(mixed_json()).expect("mixed corpus is valid");
    SearchEngine::build(corpus, Language::Latin, synonyms(&[]), SearchConfig::default())
}

/// Builds a synonym table from literal pairs.
#[allow(dead_code)]
pub fn synonyms(pairs: &[(&str, &[&str])]) -> SynonymTable {
    SynonymTable::new(
        pairs
            .iter()
            .map(|(phrase, alternatives)| {
                let value = SynonymValue::Many(alternatives.iter().map(|a| a.to_string()).collect());
                (phrase.to_string(), value)
            })
            .collect(),
    )
}

/// A temporary directory holding corpus and synonym files.
#[allow(dead_code)]
pub struct TempCorpus {
    temp: TempDir,
}

#[allow(dead_code)]
impl TempCorpus {
    pub fn new() -> Self {
        Self {
            temp: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Writes `contents` to `name` inside the directory and returns its path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp.path().join(name);
        std::fs::write(&path, contents).expect("Failed to write fixture file");
        path
    }
}
