//! TF-IDF ranking over a loaded [`SearchIndex`].

use std::sync::Arc;

use docsearch_core::error::{Error, Result};
use docsearch_core::traits::SearchBackend;
use docsearch_core::types::{
    ArticleInfo, DocId, FieldWeights, Highlights, SearchFilters, SearchHit, SearchIndex, SearchResult, SourceKind,
};

use crate::highlight::highlight;
use crate::query::{parse_query, ParsedQuery, QueryOperator};
use crate::retrieval::{DocScores, Retriever};

/// Default excerpt length in characters.
pub const DEFAULT_EXCERPT_LEN: usize = 200;

/// Read-only search engine. Cheap to clone; the index is shared.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    index: Arc<SearchIndex>,
    weights: FieldWeights,
    excerpt_len: usize,
}

impl SearchEngine {
    pub fn new(index: SearchIndex) -> Self {
        Self::from_shared(Arc::new(index))
    }

    pub fn from_shared(index: Arc<SearchIndex>) -> Self {
        Self { index, weights: FieldWeights::default(), excerpt_len: DEFAULT_EXCERPT_LEN }
    }

    pub fn with_weights(mut self, weights: FieldWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_excerpt_len(mut self, excerpt_len: usize) -> Self {
        self.excerpt_len = excerpt_len;
        self
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn weights(&self) -> &FieldWeights {
        &self.weights
    }

    pub fn parse_query(&self, raw: &str) -> ParsedQuery {
        parse_query(raw, &self.weights)
    }

    pub fn search_term(&self, term: &str) -> DocScores {
        Retriever::new(&self.index, &self.weights).search_term(term)
    }

    pub fn search_phrase(&self, phrase: &str) -> DocScores {
        Retriever::new(&self.index, &self.weights).search_phrase(phrase)
    }

    /// Ranked results for `query`, at most `max_results` of them.
    ///
    /// A query with neither plain terms nor operators returns nothing.
    pub fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        self.search_with_filters(query, &SearchFilters { max_results, ..SearchFilters::default() })
    }

    pub fn search_with_filters(&self, query: &str, filters: &SearchFilters) -> Result<Vec<SearchResult>> {
        let parsed = self.parse_query(query);
        let terms = parsed.terms();
        if terms.is_empty() && parsed.operators.is_empty() {
            return Ok(Vec::new());
        }

        let retriever = Retriever::new(&self.index, &self.weights);
        let content_weight = self.weights.content;
        let mut scores = DocScores::new();

        for term in &terms {
            scores.merge(&retriever.search_term_in(term, filters.field), content_weight);
        }

        let mut excluded = Vec::new();
        for operator in &parsed.operators {
            match operator {
                QueryOperator::Phrase(phrase) => {
                    scores.merge(&retriever.search_phrase(phrase), content_weight);
                }
                QueryOperator::Boost { value, field, weight } => {
                    scores.merge(&retriever.search_term_in(value, Some(*field)), *weight);
                }
                QueryOperator::Exclude(term) => excluded.push(term.as_str()),
            }
        }

        // exclusions only after every positive merge
        for term in excluded {
            let docs = retriever.docs_containing(term);
            scores.retain(|doc_id, _| !docs.contains(doc_id));
        }

        let mut ranked = scores.into_vec();
        if let Some((doc_id, score)) = ranked.iter().find(|(_, score)| !score.is_finite()) {
            return Err(Error::Search(format!("score for '{}' is not finite ({})", doc_id, score)));
        }
        if let Some(min_score) = filters.min_score {
            ranked.retain(|(_, score)| *score >= min_score);
        }
        let matched = ranked.len();
        // stable: ties keep first-insertion order
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(filters.max_results);

        let results: Vec<SearchResult> = ranked
            .into_iter()
            .filter_map(|(doc_id, score)| self.build_result(doc_id, score, &parsed.query))
            .collect();

        tracing::debug!(
            query,
            terms = terms.len(),
            operators = parsed.operators.len(),
            matched,
            returned = results.len(),
            "search complete"
        );
        Ok(results)
    }

    fn build_result(&self, doc_id: DocId, score: f64, plain_query: &str) -> Option<SearchResult> {
        let article = self.index.article(&doc_id)?;
        let excerpt = excerpt(article, self.excerpt_len);
        let highlights = Highlights { title: highlight(&article.title, plain_query), content: highlight(&excerpt, plain_query) };
        Some(SearchResult {
            id: doc_id,
            title: article.title.clone(),
            path: article.path.clone(),
            excerpt,
            score,
            highlights,
            sections: article.sections.clone(),
            code_blocks: article.code_blocks.clone(),
        })
    }
}

/// Title-based excerpt; the index does not carry article bodies.
fn excerpt(article: &ArticleInfo, max_chars: usize) -> String {
    if article.title.chars().count() > max_chars {
        let mut cut: String = article.title.chars().take(max_chars).collect();
        cut.push_str("...");
        cut
    } else {
        article.title.clone()
    }
}

impl SearchBackend for SearchEngine {
    fn query(&self, query: &str, k: usize) -> anyhow::Result<Vec<SearchHit>> {
        let hits = self
            .search(query, k)?
            .into_iter()
            .map(|r| SearchHit { id: r.id, score: r.score as f32, source: SourceKind::Ranked })
            .collect();
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str) -> ArticleInfo {
        ArticleInfo {
            id: "a".to_string(),
            title: title.to_string(),
            path: "a".to_string(),
            sections: vec![],
            code_blocks: vec![],
            word_count: 1,
        }
    }

    #[test]
    fn excerpt_truncates_long_titles_by_chars() {
        let title = "é".repeat(205);
        let cut = excerpt(&article(&title), 200);
        assert_eq!(cut.chars().count(), 203);
        assert!(cut.ends_with("..."));
        assert_eq!(excerpt(&article("Short"), 200), "Short");
    }

    #[test]
    fn empty_index_returns_nothing() {
        let engine = SearchEngine::new(SearchIndex::default());
        assert!(engine.search("kernel", 10).unwrap().is_empty());
        assert!(engine.search("", 10).unwrap().is_empty());
    }
}
