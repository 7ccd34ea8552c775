//! Query sanitization that keeps user input away from the index query syntax.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://\S+$").expect("valid URL pattern"));
static SCHEME_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://").expect("valid scheme pattern"));
static FIELD_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]*:").expect("valid field pattern"));
static PRESENCE_OPERATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\s|^)[+\-](\w+)").expect("valid operator pattern"));
static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("valid non-word pattern"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Rewrites a raw user query so the index query parser sees plain terms.
///
/// - A whole-query URL becomes its host (without `www.`) and path segments.
/// - A leading `field:` qualifier turns every colon into a space.
/// - `--` becomes a space.
/// - Leading `+`/`-` operators are stripped from words.
///
/// The rules are re-applied until nothing changes, so sanitizing twice equals
/// sanitizing once. An untouched query is returned borrowed and untrimmed.
pub fn sanitize_query_for_search(query: &str) -> Cow<'_, str> {
    let mut current = match url_search_terms(query) {
        Some(terms) => Cow::Owned(terms),
        None => Cow::Borrowed(query),
    };

    while let Some(next) = strip_query_syntax(&current) {
        current = Cow::Owned(next);
    }

    current
}

/// Turns a URL query into searchable words. `None` if the query is not a URL.
fn url_search_terms(query: &str) -> Option<String> {
    if !URL_PATTERN.is_match(query) {
        return None;
    }

    match url::Url::parse(query) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default();
            let host = host.strip_prefix("www.").unwrap_or(host);
            let segments = parsed.path().split('/').filter(|segment| !segment.is_empty());
            let terms: Vec<&str> = std::iter::once(host)
                .filter(|host| !host.is_empty())
                .chain(segments)
                .collect();
            Some(terms.join(" "))
        }
        Err(e) => {
            tracing::debug!("URL-like query failed to parse ({}), stripping symbols", e);
            let without_scheme = SCHEME_PREFIX.replace(query, "");
            Some(NON_WORD.replace_all(&without_scheme, " ").trim().to_string())
        }
    }
}

/// One pass of the operator rules. `None` when no rule applied.
fn strip_query_syntax(query: &str) -> Option<String> {
    let mut sanitized = Cow::Borrowed(query);
    let mut changed = false;

    if FIELD_PREFIX.is_match(&sanitized) {
        sanitized = Cow::Owned(sanitized.replace(':', " "));
        changed = true;
    }

    if sanitized.contains("--") {
        sanitized = Cow::Owned(sanitized.replace("--", " "));
        changed = true;
    }

    if PRESENCE_OPERATOR.is_match(&sanitized) {
        sanitized = Cow::Owned(PRESENCE_OPERATOR.replace_all(&sanitized, "$1$2").into_owned());
        changed = true;
    }

    changed.then(|| sanitized.trim().to_string())
}

/// Aggressive cleanup used when the index still rejects a sanitized query:
/// symbols become spaces and whitespace runs collapse.
pub fn fallback_query(query: &str) -> String {
    let cleaned = NON_WORD.replace_all(query, " ");
    WHITESPACE_RUN.replace_all(&cleaned, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[rstest]
    #[case("https://www.example.com/modules/ingress-nginx/", "example.com modules ingress-nginx")]
    #[case("http://deckhouse.io", "deckhouse.io")]
    #[case("HTTPS://Example.COM/A/b", "example.com A b")]
    #[case("https://x.com/a--b", "x.com a b")]
    #[case("https://x.com/-flag", "x.com flag")]
    fn test_url_queries(#[case] input: &str, #[case] expected: &str) {
        check!(sanitize_query_for_search(input) == expected);
    }

    #[test]
    fn test_unparseable_url_falls_back_to_symbol_stripping() {
        let sanitized = sanitize_query_for_search("http://[::1/path");
        check!(!sanitized.contains("http"));
        check!(!sanitized.contains('['));
        check!(sanitized.contains("path"));
    }

    #[rstest]
    #[case("title:nginx", "title nginx")]
    #[case(":version", "version")]
    #[case("a:b:c", "a b c")]
    #[case("foo --bar", "foo  bar")]
    #[case("+required -excluded", "required excluded")]
    #[case("-- a:b", "a b")]
    #[case("a---b", "a b")]
    #[case("ingress-nginx", "ingress-nginx")]
    fn test_operator_queries(#[case] input: &str, #[case] expected: &str) {
        check!(sanitize_query_for_search(input) == expected);
    }

    #[rstest]
    #[case("nginx")]
    #[case("  padded  ")]
    #[case("controller settings")]
    #[case("a+b")]
    fn test_clean_query_is_returned_unchanged(#[case] input: &str) {
        let sanitized = sanitize_query_for_search(input);
        check!(matches!(sanitized, Cow::Borrowed(_)));
        check!(sanitized == input);
    }

    #[rstest]
    #[case("https://www.example.com/a/b")]
    #[case("https://x.com/a--b/+c")]
    #[case("http://[::1/x")]
    #[case("title:foo")]
    #[case("-- a:b")]
    #[case(" --x:y ")]
    #[case("- -a")]
    #[case("+-y")]
    #[case("a----b -c +d")]
    #[case("foo bar:baz~2^3")]
    #[case("")]
    #[case("  ")]
    #[case("настройка:модуля")]
    fn test_sanitize_is_idempotent(#[case] input: &str) {
        let once = sanitize_query_for_search(input).into_owned();
        let twice = sanitize_query_for_search(&once).into_owned();
        check!(once == twice);
    }

    #[rstest]
    #[case("foo bar:baz", "foo bar baz")]
    #[case("nginx~", "nginx")]
    #[case("  spaced   out  ", "spaced out")]
    #[case("настройка^", "настройка")]
    fn test_fallback_query(#[case] input: &str, #[case] expected: &str) {
        check!(fallback_query(input) == expected);
    }
}
