//! Query operator extraction.
//!
//! Four passes run over the raw query in a fixed order: phrases (`"..."`),
//! exclusions (`-word`), title boosts (`title:word`) and code boosts
//! (`code:word`). Every pass scans the original string; the spans it matched
//! are cut out of the residual plain-term query so no token is searched both
//! as a plain term and as an operator value.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use docsearch_core::types::{Field, FieldWeights};

use crate::tokenizer::tokenize;

static PHRASE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)""#).expect("phrase pattern"));
static EXCLUDE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s)-(\w+)").expect("exclude pattern"));
static TITLE_BOOST: Lazy<Regex> = Lazy::new(|| Regex::new(r"title:(\w+)").expect("title boost pattern"));
static CODE_BOOST: Lazy<Regex> = Lazy::new(|| Regex::new(r"code:(\w+)").expect("code boost pattern"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QueryOperator {
    /// Exact contiguous match of the unquoted text.
    Phrase(String),
    /// Drop every document with any posting for the term.
    Exclude(String),
    /// Search the term in one field only, scaled by `weight`.
    Boost { value: String, field: Field, weight: f64 },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    /// Residual plain-term query with operator spans removed.
    pub query: String,
    pub operators: Vec<QueryOperator>,
}

impl ParsedQuery {
    pub fn terms(&self) -> Vec<String> {
        tokenize(&self.query)
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty() && self.terms().is_empty()
    }
}

pub fn parse_query(raw: &str, weights: &FieldWeights) -> ParsedQuery {
    let mut operators = Vec::new();
    let mut spans: Vec<(usize, usize)> = Vec::new();

    for caps in PHRASE.captures_iter(raw) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else { continue };
        operators.push(QueryOperator::Phrase(inner.as_str().to_string()));
        spans.push((whole.start(), whole.end()));
    }

    for caps in EXCLUDE.captures_iter(raw) {
        let Some(word) = caps.get(1) else { continue };
        operators.push(QueryOperator::Exclude(word.as_str().to_lowercase()));
        // span starts at the hyphen, not at the preceding whitespace
        spans.push((word.start() - 1, word.end()));
    }

    for (pattern, field) in [(&*TITLE_BOOST, Field::Title), (&*CODE_BOOST, Field::Code)] {
        for caps in pattern.captures_iter(raw) {
            let (Some(whole), Some(value)) = (caps.get(0), caps.get(1)) else { continue };
            operators.push(QueryOperator::Boost {
                value: value.as_str().to_lowercase(),
                field,
                weight: weights.weight(field),
            });
            spans.push((whole.start(), whole.end()));
        }
    }

    ParsedQuery { query: strip_spans(raw, &mut spans), operators }
}

/// Removes the byte ranges from `raw`, leaving a space at each cut, then
/// collapses whitespace.
fn strip_spans(raw: &str, spans: &mut [(usize, usize)]) -> String {
    spans.sort_unstable();
    let mut residual = String::with_capacity(raw.len());
    let mut cursor = 0;
    for &(start, end) in spans.iter() {
        if start > cursor {
            residual.push_str(&raw[cursor..start]);
        }
        residual.push(' ');
        cursor = cursor.max(end);
    }
    residual.push_str(&raw[cursor..]);
    residual.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ParsedQuery {
        parse_query(raw, &FieldWeights::default())
    }

    #[test]
    fn plain_query_has_no_operators() {
        let parsed = parse("  heap   spraying ");
        assert_eq!(parsed.query, "heap spraying");
        assert!(parsed.operators.is_empty());
    }

    #[test]
    fn extracts_operators_in_pass_order() {
        let parsed = parse(r#"code:mmap kernel -windows "use after free" title:exploit"#);
        assert_eq!(
            parsed.operators,
            vec![
                QueryOperator::Phrase("use after free".into()),
                QueryOperator::Exclude("windows".into()),
                QueryOperator::Boost { value: "exploit".into(), field: Field::Title, weight: 10.0 },
                QueryOperator::Boost { value: "mmap".into(), field: Field::Code, weight: 3.0 },
            ]
        );
        assert_eq!(parsed.query, "kernel");
    }

    #[test]
    fn exclusion_requires_token_start() {
        let parsed = parse("x-ray -Linux");
        assert_eq!(parsed.operators, vec![QueryOperator::Exclude("linux".into())]);
        assert_eq!(parsed.query, "x-ray");
    }

    #[test]
    fn hyphen_inside_phrase_is_also_an_exclusion() {
        let parsed = parse(r#""foo -bar""#);
        assert_eq!(
            parsed.operators,
            vec![QueryOperator::Phrase("foo -bar".into()), QueryOperator::Exclude("bar".into())]
        );
        assert_eq!(parsed.query, "");
    }

    #[test]
    fn operator_only_query_is_not_empty() {
        let parsed = parse("title:kernel");
        assert_eq!(parsed.query, "");
        assert!(!parsed.is_empty());
        assert!(parse("  ").is_empty());
        assert!(parse("a b").is_empty());
    }

    #[test]
    fn boost_weights_follow_configuration() {
        let weights = FieldWeights { title: 4.0, ..FieldWeights::default() };
        let parsed = parse_query("title:Heap", &weights);
        assert_eq!(
            parsed.operators,
            vec![QueryOperator::Boost { value: "heap".into(), field: Field::Title, weight: 4.0 }]
        );
    }
}
