pub mod tantivy_utils;
pub mod query;
pub mod engine;

pub use engine::{LiteHit, LiteSearchEngine};
