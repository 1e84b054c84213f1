//! Text normalization shared by indexing, querying and highlighting.

/// Shortest term kept by [`tokenize`], in characters.
pub const MIN_TERM_LEN: usize = 3;

pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Tokenize text into searchable terms
///
/// - Lowercase
/// - Replace punctuation with spaces
/// - Split on whitespace
/// - Drop tokens shorter than [`MIN_TERM_LEN`] characters
///
/// Order is preserved, which phrase matching relies on.
///
/// # Example
///
/// ```
/// use docsearch_rank::tokenizer::tokenize;
///
/// let tokens = tokenize("Buffer-Overflow in C!");
/// assert_eq!(tokens, vec!["buffer", "overflow"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if is_word_char(c) || c.is_whitespace() { c } else { ' ' })
        .collect();
    cleaned
        .split_whitespace()
        .filter(|t| t.chars().count() >= MIN_TERM_LEN)
        .map(String::from)
        .collect()
}
