//! Term and phrase retrieval over a [`SearchIndex`].

use std::collections::{HashMap, HashSet};

use docsearch_core::types::{ArticleInfo, DocId, Field, FieldWeights, SearchIndex, TermInfo};

use crate::tokenizer::tokenize;

/// Per-document scores that remember the order documents were first added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocScores {
    entries: Vec<(DocId, f64)>,
    slots: HashMap<DocId, usize>,
}

impl DocScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `score` to the document, inserting it at the end if unseen.
    pub fn add(&mut self, doc_id: &str, score: f64) {
        match self.slots.get(doc_id) {
            Some(&slot) => self.entries[slot].1 += score,
            None => {
                self.slots.insert(doc_id.to_string(), self.entries.len());
                self.entries.push((doc_id.to_string(), score));
            }
        }
    }

    /// Adds every entry of `other`, scaled by `multiplier`.
    pub fn merge(&mut self, other: &DocScores, multiplier: f64) {
        for (doc_id, score) in other.iter() {
            self.add(doc_id, score * multiplier);
        }
    }

    pub fn get(&self, doc_id: &str) -> Option<f64> {
        self.slots.get(doc_id).map(|&slot| self.entries[slot].1)
    }

    pub fn contains(&self, doc_id: &str) -> bool {
        self.slots.contains_key(doc_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(id, score)| (id.as_str(), *score))
    }

    /// Keeps the entries for which `keep` returns true, preserving order.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str, f64) -> bool,
    {
        self.entries.retain(|(id, score)| keep(id, *score));
        self.slots = self
            .entries
            .iter()
            .enumerate()
            .map(|(slot, (id, _))| (id.clone(), slot))
            .collect();
    }

    /// Entries in insertion order.
    pub fn into_vec(self) -> Vec<(DocId, f64)> {
        self.entries
    }
}

/// Read-only view of the index for a single search.
///
/// The article count is taken once at construction so every term of a query
/// sees the same idf denominator.
pub struct Retriever<'a> {
    index: &'a SearchIndex,
    weights: &'a FieldWeights,
    total_articles: usize,
}

impl<'a> Retriever<'a> {
    pub fn new(index: &'a SearchIndex, weights: &'a FieldWeights) -> Self {
        Self { index, weights, total_articles: index.article_count() }
    }

    pub fn total_articles(&self) -> usize {
        self.total_articles
    }

    /// Scores every document with a posting for `term`.
    ///
    /// An absent term yields an empty map.
    pub fn search_term(&self, term: &str) -> DocScores {
        self.search_term_in(term, None)
    }

    /// Like [`search_term`](Self::search_term), optionally limited to postings of one field.
    pub fn search_term_in(&self, term: &str, field: Option<Field>) -> DocScores {
        let mut scores = DocScores::new();
        let Some(info) = self.index.term(term) else {
            return scores;
        };
        let Some(idf) = self.idf(term, info) else {
            return scores;
        };

        for posting in &info.postings {
            if field.is_some_and(|f| f != posting.field) {
                continue;
            }
            let Some(article) = self.scorable_article(term, &posting.doc_id) else {
                continue;
            };
            let tf_norm = f64::from(posting.tf) / f64::from(article.word_count);
            scores.add(&posting.doc_id, tf_norm * idf * self.weights.weight(posting.field));
        }
        scores
    }

    /// Counts contiguous occurrences of the tokenized phrase per document.
    ///
    /// Score is occurrences times the content weight; documents without an
    /// occurrence are left out.
    pub fn search_phrase(&self, phrase: &str) -> DocScores {
        let mut scores = DocScores::new();
        let terms = tokenize(phrase);
        if terms.is_empty() {
            return scores;
        }

        let mut infos = Vec::with_capacity(terms.len());
        for term in &terms {
            match self.index.term(term) {
                Some(info) => infos.push(info),
                None => return scores,
            }
        }

        let (first, rest) = (infos[0], &infos[1..]);
        let candidates: Vec<&str> = first
            .doc_ids()
            .into_iter()
            .filter(|doc_id| rest.iter().all(|info| info.contains_doc(doc_id)))
            .collect();

        for doc_id in candidates {
            if self.scorable_article(&terms[0], doc_id).is_none() {
                continue;
            }
            let mut starts: Vec<u32> = positions_in(first, doc_id).into_iter().collect();
            starts.sort_unstable();
            let following: Vec<HashSet<u32>> = rest.iter().map(|info| positions_in(info, doc_id)).collect();

            let occurrences = starts
                .iter()
                .filter(|&&start| {
                    following.iter().enumerate().all(|(offset, positions)| {
                        start
                            .checked_add(offset as u32 + 1)
                            .is_some_and(|expected| positions.contains(&expected))
                    })
                })
                .count();

            if occurrences > 0 {
                scores.add(doc_id, occurrences as f64 * self.weights.content);
            }
        }
        scores
    }

    /// Every document with at least one posting for `term`, in any field.
    pub fn docs_containing(&self, term: &str) -> HashSet<&'a str> {
        self.index
            .term(term)
            .map(|info| info.postings.iter().map(|p| p.doc_id.as_str()).collect())
            .unwrap_or_default()
    }

    fn idf(&self, term: &str, info: &TermInfo) -> Option<f64> {
        if info.df == 0 {
            tracing::warn!(term, "term has df=0; skipping");
            return None;
        }
        let idf = (self.total_articles as f64 / f64::from(info.df)).ln();
        // df larger than the corpus only happens with a malformed index
        Some(idf.max(0.0))
    }

    fn scorable_article(&self, term: &str, doc_id: &str) -> Option<&'a ArticleInfo> {
        match self.index.article(doc_id) {
            None => {
                tracing::warn!(term, doc_id, "posting references unknown article; skipping");
                None
            }
            Some(article) if article.word_count == 0 => {
                tracing::warn!(term, doc_id, "article has zero word count; skipping");
                None
            }
            Some(article) => Some(article),
        }
    }
}

/// Union of the term's positions in `doc_id` across all of its fields.
fn positions_in(info: &TermInfo, doc_id: &str) -> HashSet<u32> {
    info.postings
        .iter()
        .filter(|p| p.doc_id == doc_id)
        .flat_map(|p| p.positions.iter().copied())
        .collect()
}
