//! Domain types shared by the ranking engine, the lite engine and the CLI.
//!
//! The index model (`SearchIndex`, `TermInfo`, `Posting`, `ArticleInfo`) is
//! produced by an external build step and serialized as camelCase JSON.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Document identifier. In practice the article's path relative to the corpus root.
pub type DocId = String;

/// Structural field a term occurrence belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Content,
    Section,
    Code,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Title, Field::Content, Field::Section, Field::Code];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Content => "content",
            Field::Section => "section",
            Field::Code => "code",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Field::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidConfig(format!("unknown field '{}'", s)))
    }
}

/// Multipliers applied to a match depending on the field it occurred in.
///
/// `content` is the base weight and is also used as the outer multiplier for
/// plain terms and phrases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    pub title: f64,
    pub content: f64,
    pub section: f64,
    pub code: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self { title: 10.0, content: 1.0, section: 2.0, code: 3.0 }
    }
}

impl FieldWeights {
    pub fn weight(&self, field: Field) -> f64 {
        match field {
            Field::Title => self.title,
            Field::Content => self.content,
            Field::Section => self.section,
            Field::Code => self.code,
        }
    }
}

/// A single (term, document, field) occurrence record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Posting {
    pub doc_id: DocId,
    pub tf: u32,
    #[serde(default)]
    pub positions: Vec<u32>,
    pub field: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermInfo {
    /// Number of distinct documents containing the term.
    pub df: u32,
    pub postings: Vec<Posting>,
}

impl TermInfo {
    pub fn contains_doc(&self, doc_id: &str) -> bool {
        self.postings.iter().any(|p| p.doc_id == doc_id)
    }

    /// Distinct document ids in posting order.
    pub fn doc_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.postings
            .iter()
            .map(|p| p.doc_id.as_str())
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// Display metadata and length statistics for one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleInfo {
    pub id: DocId,
    pub title: String,
    pub path: String,
    #[serde(default)]
    pub sections: Vec<String>,
    #[serde(default)]
    pub code_blocks: Vec<String>,
    /// Total token count; used to normalize term frequency.
    pub word_count: u32,
}

/// Something in a loaded index that retrieval will have to skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexAnomaly {
    DanglingPosting { term: String, doc_id: DocId },
    ZeroWordCount { doc_id: DocId },
    DocFrequencyMismatch { term: String, declared: u32, actual: u32 },
}

impl fmt::Display for IndexAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexAnomaly::DanglingPosting { term, doc_id } => {
                write!(f, "term '{}' has a posting for unknown article '{}'", term, doc_id)
            }
            IndexAnomaly::ZeroWordCount { doc_id } => {
                write!(f, "article '{}' has a zero word count", doc_id)
            }
            IndexAnomaly::DocFrequencyMismatch { term, declared, actual } => write!(
                f,
                "term '{}' declares df={} but postings cover {} documents",
                term, declared, actual
            ),
        }
    }
}

/// Immutable inverted index: term -> postings, article id -> metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchIndex {
    pub terms: HashMap<String, TermInfo>,
    pub articles: HashMap<DocId, ArticleInfo>,
}

impl SearchIndex {
    pub fn new(terms: HashMap<String, TermInfo>, articles: HashMap<DocId, ArticleInfo>) -> Self {
        Self { terms, articles }
    }

    pub fn term(&self, term: &str) -> Option<&TermInfo> {
        self.terms.get(term)
    }

    pub fn article(&self, doc_id: &str) -> Option<&ArticleInfo> {
        self.articles.get(doc_id)
    }

    pub fn article_count(&self) -> usize {
        self.articles.len()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::MalformedIndex(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!("index file {}", path.display())));
        }
        let index = Self::from_json_str(&fs::read_to_string(path)?)?;
        let anomalies = index.validate();
        if !anomalies.is_empty() {
            tracing::warn!(
                path = %path.display(),
                count = anomalies.len(),
                "loaded index contains anomalies; affected postings will be skipped"
            );
            for anomaly in &anomalies {
                tracing::debug!("index anomaly: {}", anomaly);
            }
        }
        Ok(index)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    /// Reports malformed data without rejecting the index.
    pub fn validate(&self) -> Vec<IndexAnomaly> {
        let mut anomalies = Vec::new();
        let mut terms: Vec<&String> = self.terms.keys().collect();
        terms.sort();
        for term in terms {
            let info = &self.terms[term];
            for posting in &info.postings {
                if !self.articles.contains_key(&posting.doc_id) {
                    anomalies.push(IndexAnomaly::DanglingPosting {
                        term: term.clone(),
                        doc_id: posting.doc_id.clone(),
                    });
                }
            }
            let actual = info.doc_ids().len() as u32;
            if actual != info.df {
                anomalies.push(IndexAnomaly::DocFrequencyMismatch {
                    term: term.clone(),
                    declared: info.df,
                    actual,
                });
            }
        }
        let mut ids: Vec<&DocId> = self.articles.keys().collect();
        ids.sort();
        for id in ids {
            if self.articles[id].word_count == 0 {
                anomalies.push(IndexAnomaly::ZeroWordCount { doc_id: id.clone() });
            }
        }
        anomalies
    }
}

/// A run of text that is either a query match or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightSegment {
    pub text: String,
    pub highlighted: bool,
}

impl HighlightSegment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), highlighted: false }
    }

    pub fn marked(text: impl Into<String>) -> Self {
        Self { text: text.into(), highlighted: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Highlights {
    pub title: Vec<HighlightSegment>,
    pub content: Vec<HighlightSegment>,
}

/// One ranked hit, rebuilt for every query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: DocId,
    pub title: String,
    pub path: String,
    pub excerpt: String,
    pub score: f64,
    pub highlights: Highlights,
    pub sections: Vec<String>,
    pub code_blocks: Vec<String>,
}

/// Optional restrictions applied on top of a ranked search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    /// Restrict plain-term postings to a single field.
    pub field: Option<Field>,
    pub min_score: Option<f64>,
    pub max_results: usize,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self { field: None, min_score: None, max_results: 50 }
    }
}

/// A heading and the prose that follows it, up to the next heading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentSection {
    pub title: String,
    pub content: String,
}

/// A parsed source article, before it is turned into postings.
///
/// - `id`: stable identity (path relative to the corpus root)
/// - `path`: original location of the file
/// - `content`: prose with code fences removed
/// - `sections`: sub-headings with their bodies
/// - `code_blocks`: bodies of fenced code blocks, in document order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument {
    pub id: DocId,
    pub path: String,
    pub title: String,
    pub content: String,
    pub sections: Vec<DocumentSection>,
    pub code_blocks: Vec<String>,
}

/// Indicates which engine produced a hit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Ranked,
    Lite,
}

/// The minimal surface returned by all engines.
///
/// `score` is engine-specific but higher is always better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: DocId,
    pub score: f32,
    pub source: SourceKind,
}
