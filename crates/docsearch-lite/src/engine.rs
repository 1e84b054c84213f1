use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::Query;
use tantivy::schema::Value;
use tantivy::{doc, DocAddress, Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, TantivyDocument};

use docsearch_core::config::LiteSettings;
use docsearch_core::traits::{DocumentIndexer, SearchBackend};
use docsearch_core::types::{SearchHit, SourceDocument, SourceKind};

use crate::query::{build_query, match_clauses, MatchClause};
use crate::tantivy_utils::{build_schema, register_tokenizer, LiteFields};

const WRITER_HEAP_BYTES: usize = 50_000_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiteHit {
	pub id: String,
	pub title: String,
	pub path: String,
	pub score: f32,
	/// Query word to the fields ("title", "sections", "content") it matched in.
	pub matches: BTreeMap<String, Vec<String>>,
}

/// Fuzzy, prefix-aware matching over titles, sections and prose.
///
/// The index is filled once; later `index_documents` calls are ignored.
pub struct LiteSearchEngine {
	index: Index,
	reader: IndexReader,
	fields: LiteFields,
	settings: LiteSettings,
	indexed: bool,
}

impl LiteSearchEngine {
	/// In-memory engine.
	pub fn new(settings: LiteSettings) -> Result<Self> {
		Self::from_index(Index::create_in_ram(build_schema()), settings)
	}

	/// Fresh on-disk engine; anything already in `index_dir` is removed.
	pub fn create_in_dir(index_dir: &Path, settings: LiteSettings) -> Result<Self> {
		if index_dir.exists() { std::fs::remove_dir_all(index_dir)?; }
		std::fs::create_dir_all(index_dir)?;
		Self::from_index(Index::create_in_dir(index_dir, build_schema())?, settings)
	}

	/// Opens an index written earlier. A non-empty index counts as indexed.
	pub fn open_in_dir(index_dir: &Path, settings: LiteSettings) -> Result<Self> {
		let mut engine = Self::from_index(Index::open_in_dir(index_dir)?, settings)?;
		engine.indexed = engine.reader.searcher().num_docs() > 0;
		Ok(engine)
	}

	fn from_index(index: Index, settings: LiteSettings) -> Result<Self> {
		register_tokenizer(&index);
		let fields = LiteFields::from_schema(&index.schema())?;
		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
		Ok(Self { index, reader, fields, settings, indexed: false })
	}

	pub fn is_indexed(&self) -> bool {
		self.indexed
	}

	pub fn num_docs(&self) -> u64 {
		self.reader.searcher().num_docs()
	}

	/// Adds `docs` and commits. Returns how many were added; zero when the
	/// engine was already indexed.
	pub fn index_documents(&mut self, docs: &[SourceDocument]) -> Result<usize> {
		if self.indexed {
			tracing::debug!("lite index already built; ignoring {} documents", docs.len());
			return Ok(0);
		}
		let mut index_writer: IndexWriter = self.index.writer(WRITER_HEAP_BYTES)?;
		for d in docs {
			index_writer.add_document(doc!(
				self.fields.id => d.id.clone(),
				self.fields.path => d.path.clone(),
				self.fields.title => d.title.clone(),
				self.fields.content => d.content.clone(),
				self.fields.sections => flatten_sections(d),
			))?;
		}
		index_writer.commit()?;
		self.reader.reload()?;
		self.indexed = true;
		tracing::info!("lite index built with {} documents", docs.len());
		Ok(docs.len())
	}

	pub fn search(&self, query: &str, limit: usize) -> Result<Vec<LiteHit>> {
		if !self.indexed {
			tracing::debug!("lite search before indexing");
			return Ok(vec![]);
		}
		if limit == 0 { return Ok(vec![]); }
		let Some(q) = build_query(query, &self.fields, &self.settings) else { return Ok(vec![]) };

		let searcher = self.reader.searcher();
		let top_docs = searcher.search(&q, &TopDocs::with_limit(limit))?;
		let clauses = match_clauses(query, &self.fields, &self.settings);
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr)?;
			let text = |field: tantivy::schema::Field| doc.get_first(field).and_then(|v| v.as_str()).unwrap_or("").to_string();
			let matches = matched_fields(&clauses, &searcher, addr);
			hits.push(LiteHit { id: text(self.fields.id), title: text(self.fields.title), path: text(self.fields.path), score, matches });
		}
		tracing::debug!(query, hits = hits.len(), "lite search complete");
		Ok(hits)
	}
}

/// `explain` only succeeds for documents the clause matches.
fn matched_fields(clauses: &[MatchClause], searcher: &Searcher, addr: DocAddress) -> BTreeMap<String, Vec<String>> {
	let mut matches = BTreeMap::new();
	for (word, per_field) in clauses {
		let found: Vec<String> = per_field.iter().filter(|(_, clause)| clause.explain(searcher, addr).is_ok()).map(|(name, _)| name.to_string()).collect();
		if !found.is_empty() { matches.insert(word.clone(), found); }
	}
	matches
}

fn flatten_sections(doc: &SourceDocument) -> String {
	doc.sections.iter().map(|s| format!("{}\n{}", s.title, s.content)).collect::<Vec<_>>().join("\n")
}

impl DocumentIndexer for LiteSearchEngine {
	fn index(&mut self, docs: &[SourceDocument]) -> anyhow::Result<usize> {
		self.index_documents(docs)
	}
}

impl SearchBackend for LiteSearchEngine {
	fn query(&self, query: &str, k: usize) -> anyhow::Result<Vec<SearchHit>> {
		Ok(self.search(query, k)?.into_iter().map(|h| SearchHit { id: h.id, score: h.score, source: SourceKind::Lite }).collect())
	}
}
