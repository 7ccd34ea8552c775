//! Error handling types and utilities.

/// A specialized Result type for docsearch plumbing (file loading, CLI).
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods throughout the codebase.
pub type Result<T> = anyhow::Result<T>;

/// The index query parser rejected a query string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryParseError {
    /// A `field:term` qualifier named a field the index does not have.
    #[error("unrecognised field '{field}', possible fields: {allowed}")]
    UnknownField { field: String, allowed: String },
    /// A `:`, `^` or `~` modifier with nothing attached to it.
    #[error("expecting {expected} after '{modifier}' at position {position}")]
    DanglingModifier {
        modifier: char,
        expected: &'static str,
        position: usize,
    },
    /// A `^` or `~` modifier followed by something that is not a number.
    #[error("{modifier} modifier must be numeric, got '{value}'")]
    NonNumericModifier { modifier: char, value: String },
}

/// Failure while answering a SEARCH request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SearchError {
    #[error("Search index is not initialized")]
    NotInitialized,
    #[error("query could not be parsed: {0}")]
    QueryParse(#[from] QueryParseError),
}

/// Failure while handling an INIT request.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("corpus is not valid search data: {0}")]
    InvalidCorpus(#[source] serde_json::Error),
    #[error("synonym table is malformed: {0}")]
    InvalidSynonyms(String),
    #[error("INIT field '{field}' is malformed: {message}")]
    InvalidField { field: &'static str, message: String },
}
