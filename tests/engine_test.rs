mod common;

use assert2::{check, let_assert};
use common::{TempCorpus, mixed_engine, scenario_engine, scenario_json, synonyms};
use docsearch::config::{load_search_data, load_synonyms};
use docsearch::search::{normalize_keywords, parse_keywords, sanitize_query_for_search};
use docsearch::{Language, Ref, SearchConfig, SearchData, SearchEngine, SynonymTable};
use rstest::rstest;
use serde_json::json;

fn refs(engine: &SearchEngine, query: &str) -> Vec<Ref> {
    let outcome = engine.search(query).expect("search should succeed");
    outcome.results.iter().map(|hit| hit.reference).collect()
}

// --- Scenario corpus ---

#[rstest]
fn scenario_exact_query_finds_page(scenario_engine: SearchEngine) {
    check!(refs(&scenario_engine, "nginx") == vec![Ref::Document(0)]);
}

#[rstest]
fn scenario_typo_resolves_through_fuzzy(scenario_engine: SearchEngine) {
    let_assert!(Ok(outcome) = scenario_engine.search("ngnix"));
    check!(outcome.results.len() == 1);
    check!(outcome.results[0].reference == Ref::Document(0));
    check!(outcome.highlight_query.contains("nginx"));
}

#[rstest]
fn scenario_ref_serializes_as_string(scenario_engine: SearchEngine) {
    let_assert!(Ok(outcome) = scenario_engine.search("ingress"));
    let value = serde_json::to_value(&outcome).unwrap();
    check!(value["results"][0]["ref"] == "doc_0");
    check!(value["highlightQuery"] == "ingress");
}

// --- Ref stability ---

#[rstest]
#[case("proxy", Ref::Document(0))]
#[case("cri", Ref::Document(1))]
#[case("gallery", Ref::Document(2))]
#[case("bpfLBMode", Ref::Parameter(0))]
#[case("nodeType", Ref::Parameter(1))]
fn unique_token_returns_its_entity(
    mixed_engine: SearchEngine,
    #[case] query: &str,
    #[case] expected: Ref,
) {
    check!(refs(&mixed_engine, query) == vec![expected]);
    let_assert!(Some(entry) = mixed_engine.resolve(expected));
    check!(entry.kind() == expected.kind());
}

#[rstest]
fn identical_entities_stay_distinct() {
    let page = json!({"title": "Twin", "content": "twin"});
    let corpus = SearchData::from_value(json!({"documents": [page.clone(), page]})).unwrap();
    let engine = SearchEngine::build(
        corpus,
        Language::Latin,
        SynonymTable::default(),
        SearchConfig::default(),
    );
    check!(refs(&engine, "twin") == vec![Ref::Document(0), Ref::Document(1)]);
}

// --- Field boosts ---

#[test]
fn title_match_outranks_content_match() {
    let corpus = SearchData::from_value(json!({
        "documents": [
            {"title": "Overview", "content": "zebra"},
            {"title": "zebra", "content": "Overview"}
        ]
    }))
    .unwrap();
    let engine = SearchEngine::build(
        corpus,
        Language::Latin,
        SynonymTable::default(),
        SearchConfig::default(),
    );
    let_assert!(Ok(outcome) = engine.search("zebra"));
    check!(outcome.results[0].reference == Ref::Document(1));
    check!(outcome.results[0].score > outcome.results[1].score);
}

// --- Keyword normalization and sanitizing ---

#[test]
fn keyword_shapes_normalize_identically() {
    check!(parse_keywords(&json!("a, b, c")) == parse_keywords(&json!(["a", "b", "c"])));
    check!(normalize_keywords(&json!("a, b, c")) == normalize_keywords(&json!(["a", "b", "c"])));
}

#[rstest]
#[case("https://www.deckhouse.io/modules/cni-cilium/")]
#[case("http://")]
#[case("title:nginx")]
#[case("module: -cilium +ebpf")]
#[case("foo --bar")]
#[case("+-+a")]
#[case("::--::")]
#[case("  plain  ")]
fn sanitizing_is_idempotent(#[case] query: &str) {
    let once = sanitize_query_for_search(query).into_owned();
    check!(sanitize_query_for_search(&once) == once);
}

// --- Fallback chain ---

#[rstest]
fn synonym_fallback_adopts_first_productive_candidate() {
    let corpus = SearchData::from_value(common::mixed_json()).unwrap();
    let engine = SearchEngine::build(
        corpus,
        Language::Latin,
        synonyms(&[("xyzzy123", &["nothingmatches", "widget"])]),
        SearchConfig::default(),
    );
    let_assert!(Ok(outcome) = engine.search("xyzzy123"));
    check!(outcome.highlight_query == "widget");
    check!(outcome.results.iter().any(|hit| hit.reference == Ref::Document(2)));
}

#[rstest]
fn fuzzy_fallback_finds_misspelled_term(mixed_engine: SearchEngine) {
    let_assert!(Ok(outcome) = mixed_engine.search("continerd"));
    check!(outcome.highlight_query == "containerd");
    check!(outcome.results.iter().any(|hit| hit.reference == Ref::Document(1)));
}

#[rstest]
#[case("qwxzvbnm", "qwxzvbnm")]
#[case("+qwxzvbnm", "qwxzvbnm")]
fn unknown_token_is_empty_not_error(
    mixed_engine: SearchEngine,
    #[case] query: &str,
    #[case] highlight: &str,
) {
    let_assert!(Ok(outcome) = mixed_engine.search(query));
    check!(outcome.results.is_empty());
    check!(outcome.highlight_query == highlight);
}

#[rstest]
fn empty_query_is_empty(mixed_engine: SearchEngine) {
    let_assert!(Ok(outcome) = mixed_engine.search(""));
    check!(outcome.results.is_empty());
}

// --- Language modes ---

#[test]
fn russian_pages_match_inflected_queries() {
    let corpus = SearchData::from_value(json!({
        "documents": [
            {"title": "Настройка модуля", "module": "cni-cilium", "moduletype": "Сеть"},
            {"title": "Networking"}
        ]
    }))
    .unwrap();
    let engine = SearchEngine::build(
        corpus,
        Language::from_tag("ru"),
        SynonymTable::default(),
        SearchConfig::default(),
    );
    check!(refs(&engine, "настройки") == vec![Ref::Document(0)]);
    check!(refs(&engine, "сеть") == vec![Ref::Document(0)]);
    check!(refs(&engine, "networking") == vec![Ref::Document(1)]);
}

// --- Display ranking ---

#[rstest]
fn ranked_search_groups_results(mixed_engine: SearchEngine) {
    let_assert!(Ok(ranked) = mixed_engine.search_ranked("cilium"));
    check!(ranked.groups.modules.len() == 1);
    check!(ranked.groups.modules[0].reference == "module_page_cni-cilium");
    check!(ranked.groups.document.first().map(|h| h.reference) == Some(Ref::Document(0)));
    check!(ranked.groups.parameter_other.first().map(|h| h.reference) == Some(Ref::Parameter(0)));

    let_assert!(Ok(ranked) = mixed_engine.search_ranked("nodegroup"));
    check!(ranked.groups.is_resource_name_match.first().map(|h| h.reference) == Some(Ref::Parameter(1)));
}

#[rstest]
fn ranked_grouping_matches_names_against_the_typed_query(mixed_engine: SearchEngine) {
    // The operator is stripped for the lookup but kept for name matching.
    let_assert!(Ok(ranked) = mixed_engine.search_ranked("+nodegroup"));
    check!(ranked.highlight_query == "nodegroup");
    check!(ranked.groups.is_resource_name_match.is_empty());
    check!(ranked.groups.is_resource_other.first().map(|h| h.reference) == Some(Ref::Parameter(1)));
}

// --- File loading ---

#[test]
fn corpus_and_synonym_files_drive_the_engine() {
    let dir = TempCorpus::new();
    let corpus_path = dir.write("search.json", &scenario_json().to_string());
    let synonyms_path = dir.write("synonyms.toml", "lb = [\"nginx\"]\n");

    let_assert!(Ok(corpus) = load_search_data(&corpus_path));
    let_assert!(Ok(table) = load_synonyms(&synonyms_path));
    let engine = SearchEngine::build(corpus, Language::Latin, table, SearchConfig::default());

    let_assert!(Ok(outcome) = engine.search("LB"));
    check!(outcome.highlight_query == "nginx");
    check!(outcome.results.len() == 1);
    check!(dir.path().join("search.json").exists());
}
