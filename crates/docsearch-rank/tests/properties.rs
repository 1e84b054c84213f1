use proptest::prelude::*;

use docsearch_rank::highlight::highlight;
use docsearch_rank::query::parse_query;
use docsearch_rank::tokenize;
use docsearch_core::types::FieldWeights;

proptest! {
    #[test]
    fn tokenize_is_idempotent(text in "[ -~\\t\\n]{0,80}") {
        let once = tokenize(&text);
        prop_assert_eq!(tokenize(&once.join(" ")), once);
    }

    #[test]
    fn tokens_are_lowercase_and_long_enough(text in "[ -~À-ÿ]{0,60}") {
        for token in tokenize(&text) {
            prop_assert!(token.chars().count() >= 3);
            prop_assert_eq!(token.to_lowercase(), token.clone());
        }
    }

    #[test]
    fn highlight_round_trips(text in "[a-zA-Z .,()-]{0,80}", query in "[a-zA-Z ]{0,20}") {
        let joined: String = highlight(&text, &query).into_iter().map(|s| s.text).collect();
        prop_assert_eq!(joined, text);
    }

    #[test]
    fn residual_query_never_keeps_operator_syntax(word in "[a-z]{3,8}", other in "[a-z]{3,8}") {
        let raw = format!("{} title:{} -{}", other, word, word);
        let parsed = parse_query(&raw, &FieldWeights::default());
        prop_assert_eq!(parsed.query, other);
        prop_assert_eq!(parsed.operators.len(), 2);
    }
}
