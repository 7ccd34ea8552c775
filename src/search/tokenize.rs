//! Text tokenization, keyword normalization and stemming for search indexing.

use rust_stemmers::{Algorithm, Stemmer};
use serde_json::Value;

/// Minimum dictionary word length, in characters.
const MIN_WORD_LENGTH: usize = 2;

/// Common English stop words to filter out from indexing.
/// These high-frequency words add little value to search relevance.
pub(crate) const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "that", "the", "to", "was", "will", "with",
];

/// Russian stop words, only filtered when indexing in Cyrillic mode.
pub(crate) const RUSSIAN_STOP_WORDS: &[&str] = &[
    "и", "в", "во", "не", "что", "он", "на", "я", "с", "со", "как", "а", "то", "все", "она", "так",
    "его", "но", "да", "ты", "к", "у", "же", "вы", "за", "бы", "по", "ее", "мне", "было", "вот",
    "от", "меня", "еще", "нет", "о", "из", "ему", "для", "это",
];

/// Flattens a keywords value into trimmed, non-empty keywords.
///
/// Accepts a list of strings or a single string; every entry may itself be
/// comma separated. Any other JSON shape yields no keywords.
pub fn parse_keywords(value: &Value) -> Vec<String> {
    let split = |text: &str| -> Vec<String> {
        text.split(',')
            .map(str::trim)
            .filter(|keyword| !keyword.is_empty())
            .map(str::to_string)
            .collect()
    };

    match value {
        Value::String(text) => split(text),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .flat_map(split)
            .collect(),
        _ => vec![],
    }
}

/// Space-joins [`parse_keywords`] into one indexable text field.
pub fn normalize_keywords(value: &Value) -> String {
    parse_keywords(value).join(" ")
}

/// Extracts dictionary words from free text.
///
/// Lowercases, turns every character that is not a letter, digit, whitespace or
/// hyphen into a space, splits on hyphens and whitespace, and keeps words of at
/// least two characters that contain a letter and are not purely numeric.
pub fn extract_words(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphabetic() || c.is_numeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|word| word.chars().count() >= MIN_WORD_LENGTH)
        .filter(|word| !word.chars().all(|c| c.is_ascii_digit()))
        .filter(|word| word.chars().any(char::is_alphabetic))
        .map(str::to_string)
        .collect()
}

/// True for letters of the Russian alphabet, either case.
pub fn is_cyrillic_letter(c: char) -> bool {
    matches!(c, 'а'..='я' | 'А'..='Я' | 'ё' | 'Ё')
}

pub fn contains_cyrillic(text: &str) -> bool {
    text.chars().any(is_cyrillic_letter)
}

/// Tokenization mode of an index, fixed when the index is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Language {
    /// English stemming only.
    #[default]
    Latin,
    /// English and Russian stemming, picked per token by script.
    Cyrillic,
}

impl Language {
    /// Maps a site language tag (`en`, `ru`, ...) to an index mode.
    pub fn from_tag(tag: &str) -> Self {
        let primary = tag.split(['-', '_']).next().unwrap_or_default();
        if primary.eq_ignore_ascii_case("ru") {
            Self::Cyrillic
        } else {
            Self::Latin
        }
    }
}

/// Index-time and query-time text pipeline: split, trim, lowercase, stop-word
/// filter, stem.
pub struct Analyzer {
    language: Language,
    english: Stemmer,
    russian: Option<Stemmer>,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("language", &self.language)
            .finish()
    }
}

impl Analyzer {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            english: Stemmer::create(Algorithm::English),
            russian: (language == Language::Cyrillic).then(|| Stemmer::create(Algorithm::Russian)),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Tokenizes a field value into stemmed index terms.
    ///
    /// Splits on whitespace and hyphens, so `ingress-nginx` yields `ingress` and
    /// `nginx`.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.split(|c: char| c.is_whitespace() || c == '-')
            .filter_map(|token| self.analyze(token, true))
            .collect()
    }

    /// Runs a single query term through the pipeline, without stop-word
    /// filtering. Returns `None` when nothing searchable is left.
    pub fn analyze_term(&self, term: &str) -> Option<String> {
        self.analyze(term, false)
    }

    fn analyze(&self, token: &str, filter_stop_words: bool) -> Option<String> {
        let trimmed = trim_non_word(token);
        if trimmed.is_empty() {
            return None;
        }
        let lowercase = trimmed.to_lowercase();

        if filter_stop_words && self.is_stop_word(&lowercase) {
            return None;
        }

        let stemmed = match &self.russian {
            Some(russian) if contains_cyrillic(&lowercase) => russian.stem(&lowercase),
            _ => self.english.stem(&lowercase),
        };
        Some(stemmed.into_owned())
    }

    fn is_stop_word(&self, word: &str) -> bool {
        STOP_WORDS.contains(&word)
            || (self.language == Language::Cyrillic && RUSSIAN_STOP_WORDS.contains(&word))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Strips leading and trailing non-word characters.
pub(crate) fn trim_non_word(token: &str) -> &str {
    token.trim_matches(|c: char| !is_word_char(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!("a, b, c"), &["a", "b", "c"])]
    #[case(json!(["a", "b", "c"]), &["a", "b", "c"])]
    #[case(json!(["a, b", " c "]), &["a", "b", "c"])]
    #[case(json!(" , ,x,"), &["x"])]
    #[case(json!(["", "  "]), &[])]
    #[case(json!(null), &[])]
    #[case(json!(42), &[])]
    #[case(json!({"k": "v"}), &[])]
    #[case(json!([1, "kept"]), &["kept"])]
    fn test_parse_keywords(#[case] value: Value, #[case] expected: &[&str]) {
        check!(parse_keywords(&value) == expected);
    }

    #[test]
    fn test_keyword_forms_normalize_identically() {
        let joined = json!("a, b, c");
        let listed = json!(["a", "b", "c"]);
        check!(parse_keywords(&joined) == parse_keywords(&listed));
        check!(normalize_keywords(&joined) == normalize_keywords(&listed));
        check!(normalize_keywords(&listed) == "a b c");
    }

    #[rstest]
    #[case("Ingress Nginx Controller", &["ingress", "nginx", "controller"])]
    #[case("ingress-nginx", &["ingress", "nginx"])]
    #[case("snake_case_name", &["snake", "case", "name"])]
    #[case("v1 2024 k8s x", &["v1", "k8s"])]
    #[case("Модуль cni-cilium: настройка", &["модуль", "cni", "cilium", "настройка"])]
    #[case("spec.nodeGroups[0]", &["spec", "nodegroups"])]
    #[case("", &[])]
    #[case("123 45", &[])]
    fn test_extract_words(#[case] input: &str, #[case] expected: &[&str]) {
        check!(extract_words(input) == expected);
    }

    #[test]
    fn test_extract_words_keeps_duplicates() {
        check!(extract_words("nginx nginx") == vec!["nginx", "nginx"]);
    }

    #[rstest]
    #[case("en", Language::Latin)]
    #[case("ru", Language::Cyrillic)]
    #[case("RU", Language::Cyrillic)]
    #[case("ru-RU", Language::Cyrillic)]
    #[case("", Language::Latin)]
    #[case("de", Language::Latin)]
    fn test_language_from_tag(#[case] tag: &str, #[case] expected: Language) {
        check!(Language::from_tag(tag) == expected);
    }

    #[rstest]
    #[case("the quick brown fox", &["quick", "brown", "fox"])]
    #[case("Configures controllers", &["configur", "control"])]
    #[case("ingress-nginx, module.", &["ingress", "nginx", "modul"])]
    fn test_tokenize_latin(#[case] input: &str, #[case] expected: &[&str]) {
        let analyzer = Analyzer::new(Language::Latin);
        check!(analyzer.tokenize(input) == expected);
    }

    #[test]
    fn test_cyrillic_mode_stems_both_alphabets() {
        let analyzer = Analyzer::new(Language::Cyrillic);
        let tokens = analyzer.tokenize("настройки модулей controllers");
        check!(tokens.contains(&"настройк".to_string()));
        check!(tokens.contains(&"модул".to_string()));
        check!(tokens.contains(&"control".to_string()));
    }

    #[test]
    fn test_cyrillic_stop_words_only_in_cyrillic_mode() {
        let latin = Analyzer::new(Language::Latin);
        let cyrillic = Analyzer::new(Language::Cyrillic);
        check!(latin.tokenize("и").len() == 1);
        check!(cyrillic.tokenize("и").is_empty());
    }

    #[test]
    fn test_query_terms_skip_stop_word_filter() {
        let analyzer = Analyzer::new(Language::Latin);
        check!(analyzer.analyze_term("the") == Some("the".to_string()));
        check!(analyzer.analyze_term("...") == None);
        check!(analyzer.analyze_term("Nginx,") == Some("nginx".to_string()));
    }

    #[rstest]
    #[case("Москва")]
    #[case("日本")]
    #[case("🦀")]
    fn test_unicode_handling(#[case] input: &str) {
        let analyzer = Analyzer::new(Language::Cyrillic);
        // Should not panic, even if it produces empty results
        let _tokens = analyzer.tokenize(input);
        let _words = extract_words(input);
    }

    #[test]
    fn test_empty_and_whitespace() {
        let analyzer = Analyzer::new(Language::Latin);
        check!(analyzer.tokenize("").is_empty());
        check!(analyzer.tokenize("   ").is_empty());
        check!(analyzer.tokenize("\n\t").is_empty());
    }
}
