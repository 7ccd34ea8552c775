//! Searchable corpus model: documentation pages and documented parameters.
//!
//! The corpus arrives as JSON with two lists. Entities are identified purely by
//! their position, surfaced as [`Ref`] (`doc_<i>` / `param_<i>`).

use crate::error::InitError;
use crate::search::tokenize::normalize_keywords;
use ahash::AHashSet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Raw corpus as emitted by the site generator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub documents: Vec<Document>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: Vec<Parameter>,
}

impl SearchData {
    /// Parse the corpus from an already-decoded JSON value.
    ///
    /// `null` is treated as an empty corpus.
    pub fn from_value(value: serde_json::Value) -> Result<Self, InitError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(InitError::InvalidCorpus)
    }

    /// Parse the corpus from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, InitError> {
        serde_json::from_str(text).map_err(InitError::InvalidCorpus)
    }

    /// Look up an entity by reference in O(1).
    pub fn get(&self, reference: Ref) -> Option<EntryRef<'_>> {
        match reference {
            Ref::Document(i) => self.documents.get(i).map(EntryRef::Document),
            Ref::Parameter(i) => self.parameters.get(i).map(EntryRef::Parameter),
        }
    }

    /// All entities in index order: documents first, then parameters.
    pub fn entries(&self) -> impl Iterator<Item = (Ref, EntryRef<'_>)> {
        let documents = self
            .documents
            .iter()
            .enumerate()
            .map(|(i, doc)| (Ref::Document(i), EntryRef::Document(doc)));
        let parameters = self
            .parameters
            .iter()
            .enumerate()
            .map(|(i, param)| (Ref::Parameter(i), EntryRef::Parameter(param)));
        documents.chain(parameters)
    }

    /// Distinct trimmed module names, in order of first appearance.
    pub fn available_modules(&self) -> Vec<String> {
        let mut seen = AHashSet::new();
        let mut modules = Vec::new();
        for (_, entry) in self.entries() {
            let module = entry.module().trim();
            if !module.is_empty() && seen.insert(module) {
                modules.push(module.to_string());
            }
        }
        modules
    }

    pub fn len(&self) -> usize {
        self.documents.len() + self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A documentation page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Either a string (possibly comma separated) or a list of strings.
    #[serde(default)]
    pub keywords: serde_json::Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub module: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default)]
    pub moduletype: Option<String>,
    #[serde(default, rename = "_indexBoost")]
    pub index_boost: Option<f64>,
}

/// A documented configuration or API parameter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub keywords: serde_json::Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub module: String,
    #[serde(default, rename = "resName", deserialize_with = "null_as_default")]
    pub res_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default)]
    pub moduletype: Option<String>,
    /// The site generator emits the string `"true"`; a JSON boolean is accepted too.
    #[serde(default, rename = "isResource")]
    pub is_resource: serde_json::Value,
    #[serde(default, rename = "_indexBoost")]
    pub index_boost: Option<f64>,
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Whether an entity is a page or a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Document,
    Parameter,
}

/// Borrowed view over either kind of entity.
#[derive(Debug, Clone, Copy)]
pub enum EntryRef<'a> {
    Document(&'a Document),
    Parameter(&'a Parameter),
}

impl<'a> EntryRef<'a> {
    pub fn kind(&self) -> EntryKind {
        match self {
            Self::Document(_) => EntryKind::Document,
            Self::Parameter(_) => EntryKind::Parameter,
        }
    }

    /// Page title, or parameter name.
    pub fn title(&self) -> &'a str {
        match self {
            Self::Document(doc) => &doc.title,
            Self::Parameter(param) => &param.name,
        }
    }

    pub fn keywords(&self) -> &'a serde_json::Value {
        match self {
            Self::Document(doc) => &doc.keywords,
            Self::Parameter(param) => &param.keywords,
        }
    }

    pub fn module(&self) -> &'a str {
        match self {
            Self::Document(doc) => &doc.module,
            Self::Parameter(param) => &param.module,
        }
    }

    /// Page summary. Parameters have none.
    pub fn summary(&self) -> &'a str {
        match self {
            Self::Document(doc) => &doc.summary,
            Self::Parameter(_) => "",
        }
    }

    /// Owning resource name. Pages have none.
    pub fn res_name(&self) -> &'a str {
        match self {
            Self::Document(_) => "",
            Self::Parameter(param) => &param.res_name,
        }
    }

    pub fn content(&self) -> &'a str {
        match self {
            Self::Document(doc) => &doc.content,
            Self::Parameter(param) => &param.content,
        }
    }

    pub fn url(&self) -> &'a str {
        match self {
            Self::Document(doc) => &doc.url,
            Self::Parameter(param) => &param.url,
        }
    }

    pub fn moduletype(&self) -> Option<&'a str> {
        match self {
            Self::Document(doc) => doc.moduletype.as_deref(),
            Self::Parameter(param) => param.moduletype.as_deref(),
        }
    }

    pub fn index_boost(&self) -> Option<f64> {
        match self {
            Self::Document(doc) => doc.index_boost,
            Self::Parameter(param) => param.index_boost,
        }
    }

    pub fn is_resource(&self) -> bool {
        match self {
            Self::Document(_) => false,
            Self::Parameter(param) => match &param.is_resource {
                serde_json::Value::Bool(flag) => *flag,
                serde_json::Value::String(flag) => flag == "true",
                _ => false,
            },
        }
    }

    /// Flatten into the common shape the index consumes.
    pub fn to_indexed(&self, reference: Ref) -> IndexedEntry {
        IndexedEntry {
            reference,
            title: self.title().to_string(),
            keywords: normalize_keywords(self.keywords()),
            module: self.module().to_string(),
            summary: self.summary().to_string(),
            content: self.content().to_string(),
            moduletype: self.moduletype().map(str::to_string),
        }
    }
}

/// Normalized entity shape shared by documents and parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedEntry {
    pub reference: Ref,
    pub title: String,
    /// Keywords space-joined into one text field.
    pub keywords: String,
    pub module: String,
    /// Empty for parameters.
    pub summary: String,
    pub content: String,
    pub moduletype: Option<String>,
}

/// Stable identifier joining an index hit back to its corpus entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Ref {
    Document(usize),
    Parameter(usize),
}

impl Ref {
    pub fn kind(&self) -> EntryKind {
        match self {
            Self::Document(_) => EntryKind::Document,
            Self::Parameter(_) => EntryKind::Parameter,
        }
    }

    pub fn position(&self) -> usize {
        match self {
            Self::Document(i) | Self::Parameter(i) => *i,
        }
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document(i) => write!(f, "doc_{}", i),
            Self::Parameter(i) => write!(f, "param_{}", i),
        }
    }
}

/// Error returned when a string is not a `doc_<i>` / `param_<i>` reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid entry reference '{0}'")]
pub struct ParseRefError(pub String);

impl FromStr for Ref {
    type Err = ParseRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseRefError(s.to_string());
        let position = |digits: &str| {
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            digits.parse::<usize>().map_err(|_| invalid())
        };
        if let Some(index) = s.strip_prefix("doc_") {
            position(index).map(Ref::Document)
        } else if let Some(index) = s.strip_prefix("param_") {
            position(index).map(Ref::Parameter)
        } else {
            Err(invalid())
        }
    }
}

impl Serialize for Ref {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Ref {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
