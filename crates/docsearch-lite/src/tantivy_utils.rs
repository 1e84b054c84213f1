//! docsearch-lite
//!
//! Tantivy schema and analyzer for the lightweight engine. Titles, prose and
//! flattened sections are indexed with positions; only identity fields and the
//! title are stored.
use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, TextAnalyzer};
use tantivy::Index;

pub const TOKENIZER_NAME: &str = "docsearch";

#[derive(Debug, Clone, Copy)]
pub struct LiteFields {
	pub id: Field,
	pub path: Field,
	pub title: Field,
	pub content: Field,
	pub sections: Field,
}

impl LiteFields {
	pub fn from_schema(schema: &Schema) -> tantivy::Result<Self> {
		Ok(Self {
			id: schema.get_field("id")?,
			path: schema.get_field("path")?,
			title: schema.get_field("title")?,
			content: schema.get_field("content")?,
			sections: schema.get_field("sections")?,
		})
	}
}

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	schema_builder.add_text_field("id", STRING | STORED);
	schema_builder.add_text_field("path", STRING | STORED);
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(TOKENIZER_NAME).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let indexed = TextOptions::default().set_indexing_options(text_field_indexing);
	schema_builder.add_text_field("title", indexed.clone().set_stored());
	schema_builder.add_text_field("content", indexed.clone());
	schema_builder.add_text_field("sections", indexed);
	schema_builder.build()
}

pub fn register_tokenizer(index: &Index) {
	let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(RemoveLongFilter::limit(40))
		.filter(LowerCaser)
		.build();
	index.tokenizers().register(TOKENIZER_NAME, tokenizer);
}
