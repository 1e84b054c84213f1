//! Ranked full-text search over a precomputed inverted index.
//!
//! A query goes through [`query::parse_query`], term and phrase retrieval in
//! [`retrieval`], merging and ranking in [`engine::SearchEngine`], and finally
//! [`highlight::highlight`] for display.

#![deny(unused_imports)]

pub mod builder;
pub mod engine;
pub mod highlight;
pub mod query;
pub mod retrieval;
pub mod session;
pub mod tokenizer;

pub use builder::IndexBuilder;
pub use engine::SearchEngine;
pub use query::{parse_query, ParsedQuery, QueryOperator};
pub use retrieval::DocScores;
pub use session::{SearchSession, SearchState};
pub use tokenizer::tokenize;
