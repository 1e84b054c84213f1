use tantivy::query::{BooleanQuery, BoostQuery, FuzzyTermQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::Term;

use docsearch_core::config::LiteSettings;

use crate::tantivy_utils::LiteFields;

/// Words shorter than this are matched exactly.
const MIN_FUZZY_LEN: usize = 3;
/// Largest edit distance tantivy builds automata for by default.
const MAX_EDIT_DISTANCE: u8 = 2;

/// Lower-cased alphanumeric words, the way the index analyzer splits text.
pub fn query_words(text: &str) -> Vec<String> {
	text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).map(str::to_lowercase).collect()
}

/// Allowed edits for a word: `fuzzy` times its length, rounded, capped at 2.
pub fn edit_distance(word: &str, fuzzy: f32) -> u8 {
	let scaled = (fuzzy * word.chars().count() as f32).round();
	if scaled <= 0.0 { 0 } else { (scaled as u8).min(MAX_EDIT_DISTANCE) }
}

/// Builds one `Should` clause per query word. Each clause matches the word in
/// title, sections or content, exactly or within the allowed edits (and as a
/// prefix when enabled), scaled by the field boost.
pub fn build_query(text: &str, fields: &LiteFields, settings: &LiteSettings) -> Option<Box<dyn Query>> {
	let words = query_words(text);
	if words.is_empty() {
		return None;
	}
	let word_queries: Vec<(Occur, Box<dyn Query>)> = words
		.iter()
		.map(|word| {
			let per_field: Vec<(Occur, Box<dyn Query>)> = searched_fields(fields, settings)
				.into_iter()
				.map(|(_, field, boost)| (Occur::Should, Box::new(BoostQuery::new(word_in_field(word, field, settings), boost)) as Box<dyn Query>))
				.collect();
			(Occur::Should, Box::new(BooleanQuery::new(per_field)) as Box<dyn Query>)
		})
		.collect();
	Some(Box::new(BooleanQuery::new(word_queries)))
}

/// One query word with an unboosted clause per searched field.
pub type MatchClause = (String, Vec<(&'static str, Box<dyn Query>)>);

/// The clauses [`build_query`] is made of, kept apart so a hit can be checked
/// word by word and field by field.
pub fn match_clauses(text: &str, fields: &LiteFields, settings: &LiteSettings) -> Vec<MatchClause> {
	let mut words = query_words(text);
	words.dedup();
	words
		.into_iter()
		.map(|word| {
			let per_field = searched_fields(fields, settings)
				.into_iter()
				.map(|(name, field, _)| (name, word_in_field(&word, field, settings)))
				.collect();
			(word, per_field)
		})
		.collect()
}

fn searched_fields(fields: &LiteFields, settings: &LiteSettings) -> [(&'static str, Field, f32); 3] {
	[("title", fields.title, settings.title_boost), ("sections", fields.sections, settings.sections_boost), ("content", fields.content, 1.0)]
}

fn word_in_field(word: &str, field: Field, settings: &LiteSettings) -> Box<dyn Query> {
	let term = Term::from_field_text(field, word);
	let exact = Box::new(TermQuery::new(term.clone(), IndexRecordOption::WithFreqs)) as Box<dyn Query>;
	if word.chars().count() < MIN_FUZZY_LEN {
		return exact;
	}
	let distance = edit_distance(word, settings.fuzzy);
	let loose = if settings.prefix { FuzzyTermQuery::new_prefix(term, distance, true) } else { FuzzyTermQuery::new(term, distance, true) };
	// exact hits score on both clauses and rank above typo matches
	Box::new(BooleanQuery::new(vec![(Occur::Should, exact), (Occur::Should, Box::new(loose) as Box<dyn Query>)]))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn edit_distance_scales_with_length() {
		assert_eq!(edit_distance("ssh", 0.2), 1);
		assert_eq!(edit_distance("ab", 0.2), 0);
		assert_eq!(edit_distance("kernel", 0.2), 1);
		assert_eq!(edit_distance("cryptography", 0.2), 2);
		assert_eq!(edit_distance("authentication", 0.5), 2);
		assert_eq!(edit_distance("kernel", 0.0), 0);
	}

	#[test]
	fn query_words_split_like_the_analyzer() {
		assert_eq!(query_words("SQL-Injection, 101!"), vec!["sql", "injection", "101"]);
		assert!(query_words("  -- ").is_empty());
	}
}
