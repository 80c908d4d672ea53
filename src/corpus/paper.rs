//! Paper records supplied by the acquisition collaborator

use crate::embedding::fnv1a64;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Stable paper identity (DOI, arXiv id, or content hash)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct PaperId(String);

impl PaperId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn doi(doi: &str) -> Self {
        Self(format!("doi:{}", doi.trim()))
    }

    pub fn arxiv(arxiv_id: &str) -> Self {
        Self(format!("arxiv:{}", arxiv_id.trim()))
    }

    /// Identity for papers with neither DOI nor arXiv id
    pub fn content_hash(title: &str, text: &str) -> Self {
        let mut bytes = Vec::with_capacity(title.len() + text.len() + 1);
        bytes.extend_from_slice(title.as_bytes());
        bytes.push(0);
        bytes.extend_from_slice(text.as_bytes());
        Self(format!("hash:{:016x}", fnv1a64(0, &bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PaperId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PaperId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An already-parsed paper. Read-only to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    pub id: PaperId,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub full_text: Option<String>,
    /// Sentence segmentation supplied upstream, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentences: Option<Vec<String>>,
}

impl Paper {
    pub fn new(id: impl Into<PaperId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            authors: Vec::new(),
            abstract_text: None,
            full_text: None,
            sentences: None,
        }
    }

    pub fn with_authors(mut self, authors: Vec<String>) -> Self {
        self.authors = authors;
        self
    }

    pub fn with_abstract(mut self, text: impl Into<String>) -> Self {
        self.abstract_text = Some(text.into());
        self
    }

    pub fn with_full_text(mut self, text: impl Into<String>) -> Self {
        self.full_text = Some(text.into());
        self
    }

    pub fn with_sentences(mut self, sentences: Vec<String>) -> Self {
        self.sentences = Some(sentences);
        self
    }

    /// Abstract, then full text, separated by a blank line.
    ///
    /// Evidence offsets are character offsets into this string.
    pub fn document_text(&self) -> String {
        let parts: Vec<&str> = [self.abstract_text.as_deref(), self.full_text.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        parts.join("\n\n")
    }

    /// At least one of abstract or full text reaches `min_chars` characters
    pub fn is_eligible(&self, min_chars: usize) -> bool {
        [self.abstract_text.as_deref(), self.full_text.as_deref()]
            .into_iter()
            .flatten()
            .any(|t| t.trim().chars().count() >= min_chars)
    }
}

impl From<String> for PaperId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
