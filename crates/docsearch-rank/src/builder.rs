//! Builds a [`SearchIndex`] from parsed source documents.
//!
//! Token positions run across the whole document in a fixed field order
//! (title, section headings, content, code blocks) so phrase matching can
//! compare positions from different fields.

use std::collections::HashMap;

use docsearch_core::traits::DocumentIndexer;
use docsearch_core::types::{ArticleInfo, DocId, Field, Posting, SearchIndex, SourceDocument, TermInfo};

use crate::tokenizer::tokenize;

#[derive(Debug, Default)]
pub struct IndexBuilder {
    terms: HashMap<String, TermInfo>,
    articles: HashMap<DocId, ArticleInfo>,
}

/// Positions of each (term, field) pair inside one document, in first-seen order.
#[derive(Default)]
struct DocTerms {
    next: u32,
    slots: HashMap<(String, Field), usize>,
    entries: Vec<(String, Field, Vec<u32>)>,
}

impl DocTerms {
    fn push_text(&mut self, text: &str, field: Field) {
        for token in tokenize(text) {
            let slot = match self.slots.get(&(token.clone(), field)) {
                Some(&slot) => slot,
                None => {
                    self.entries.push((token.clone(), field, Vec::new()));
                    self.slots.insert((token, field), self.entries.len() - 1);
                    self.entries.len() - 1
                }
            };
            self.entries[slot].2.push(self.next);
            self.next += 1;
        }
    }
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents(docs: &[SourceDocument]) -> SearchIndex {
        let mut builder = Self::new();
        for doc in docs {
            builder.add_document(doc);
        }
        builder.build()
    }

    /// Number of documents added so far.
    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Adds one document. Returns false when it was skipped.
    pub fn add_document(&mut self, doc: &SourceDocument) -> bool {
        if self.articles.contains_key(&doc.id) {
            tracing::warn!(doc_id = doc.id.as_str(), "duplicate document id; keeping the first");
            return false;
        }

        let mut doc_terms = DocTerms::default();
        doc_terms.push_text(&doc.title, Field::Title);
        for section in &doc.sections {
            doc_terms.push_text(&section.title, Field::Section);
        }
        doc_terms.push_text(&doc.content, Field::Content);
        for block in &doc.code_blocks {
            doc_terms.push_text(block, Field::Code);
        }

        if doc_terms.next == 0 {
            tracing::debug!(doc_id = doc.id.as_str(), "document has no searchable terms; skipping");
            return false;
        }

        for (term, field, positions) in doc_terms.entries {
            self.terms.entry(term).or_default().postings.push(Posting {
                doc_id: doc.id.clone(),
                tf: positions.len() as u32,
                positions,
                field,
            });
        }
        self.articles.insert(
            doc.id.clone(),
            ArticleInfo {
                id: doc.id.clone(),
                title: doc.title.clone(),
                path: doc.path.clone(),
                sections: doc.sections.iter().map(|s| s.title.clone()).collect(),
                code_blocks: doc.code_blocks.clone(),
                word_count: doc_terms.next,
            },
        );
        true
    }

    pub fn build(mut self) -> SearchIndex {
        for info in self.terms.values_mut() {
            info.df = info.doc_ids().len() as u32;
        }
        tracing::info!(articles = self.articles.len(), terms = self.terms.len(), "index built");
        SearchIndex::new(self.terms, self.articles)
    }
}

impl DocumentIndexer for IndexBuilder {
    fn index(&mut self, docs: &[SourceDocument]) -> anyhow::Result<usize> {
        Ok(docs.iter().filter(|doc| self.add_document(doc)).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsearch_core::types::DocumentSection;

    fn doc(id: &str, title: &str, content: &str) -> SourceDocument {
        SourceDocument {
            id: id.to_string(),
            path: format!("/docs/{}", id),
            title: title.to_string(),
            content: content.to_string(),
            ..SourceDocument::default()
        }
    }

    #[test]
    fn positions_run_across_fields() {
        let mut source = doc("a.md", "Stack Overflow", "stack canary bypass");
        source.sections = vec![DocumentSection { title: "Canary leak".into(), content: String::new() }];
        source.code_blocks = vec!["leak(canary)".into()];
        let index = IndexBuilder::from_documents(&[source]);

        let stack = &index.term("stack").unwrap().postings;
        assert_eq!(stack.len(), 2);
        assert_eq!((stack[0].field, stack[0].positions.clone()), (Field::Title, vec![0]));
        assert_eq!((stack[1].field, stack[1].positions.clone()), (Field::Content, vec![4]));

        let canary = index.term("canary").unwrap();
        assert_eq!(canary.df, 1);
        let fields: Vec<Field> = canary.postings.iter().map(|p| p.field).collect();
        assert_eq!(fields, vec![Field::Section, Field::Content, Field::Code]);

        let article = index.article("a.md").unwrap();
        assert_eq!(article.word_count, 9);
        assert_eq!(article.sections, vec!["Canary leak".to_string()]);
        assert!(index.validate().is_empty());
    }

    #[test]
    fn tf_counts_repeats_within_a_field() {
        let index = IndexBuilder::from_documents(&[doc("a.md", "Heap", "heap spray heap")]);
        let content = index.term("heap").unwrap().postings.iter().find(|p| p.field == Field::Content).cloned().unwrap();
        assert_eq!(content.tf, 2);
        assert_eq!(content.positions, vec![1, 3]);
    }

    #[test]
    fn duplicate_and_empty_documents_are_skipped() {
        let mut builder = IndexBuilder::new();
        let added = builder
            .index(&[doc("a.md", "Heap", "spray"), doc("a.md", "Other", "text"), doc("b.md", "A", "")])
            .unwrap();
        assert_eq!(added, 1);
        let index = builder.build();
        assert_eq!(index.article("a.md").unwrap().title, "Heap");
        assert!(index.term("other").is_none());
    }

    #[test]
    fn df_counts_distinct_documents() {
        let index = IndexBuilder::from_documents(&[doc("a.md", "Kernel", "kernel"), doc("b.md", "Kernel modules", "")]);
        assert_eq!(index.term("kernel").unwrap().df, 2);
        assert_eq!(index.term("kernel").unwrap().postings.len(), 3);
    }
}
