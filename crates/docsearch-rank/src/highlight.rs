use regex::{Regex, RegexBuilder};

use docsearch_core::types::HighlightSegment;

use crate::tokenizer::tokenize;

/// Splits `text` into highlighted and plain segments for the terms of `query`.
///
/// Terms are applied in query order; a span claimed by an earlier term is not
/// split again. Concatenating the segment texts always gives back `text`.
///
/// ```
/// use docsearch_rank::highlight::highlight;
///
/// let segments = highlight("Heap overflow", "heap");
/// assert!(segments[0].highlighted);
/// assert_eq!(segments[0].text, "Heap");
/// assert_eq!(segments[1].text, " overflow");
/// ```
pub fn highlight(text: &str, query: &str) -> Vec<HighlightSegment> {
    let terms = tokenize(query);
    let mut segments = vec![HighlightSegment::plain(text)];
    if terms.is_empty() {
        return segments;
    }

    for term in &terms {
        let pattern = match term_pattern(term) {
            Ok(pattern) => pattern,
            Err(e) => {
                tracing::warn!(term = term.as_str(), "skipping highlight term: {}", e);
                continue;
            }
        };
        segments = segments
            .into_iter()
            .flat_map(|segment| {
                if segment.highlighted {
                    vec![segment]
                } else {
                    split_matches(&pattern, &segment.text)
                }
            })
            .collect();
    }
    segments
}

fn term_pattern(term: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&regex::escape(term)).case_insensitive(true).build()
}

fn split_matches(pattern: &Regex, text: &str) -> Vec<HighlightSegment> {
    let mut out = Vec::new();
    let mut last = 0;
    for m in pattern.find_iter(text) {
        if m.start() > last {
            out.push(HighlightSegment::plain(&text[last..m.start()]));
        }
        out.push(HighlightSegment::marked(m.as_str()));
        last = m.end();
    }
    if last < text.len() {
        out.push(HighlightSegment::plain(&text[last..]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(segments: &[HighlightSegment]) -> String {
        segments.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn no_terms_yields_single_plain_segment() {
        assert_eq!(highlight("Kernel exploits", "a -"), vec![HighlightSegment::plain("Kernel exploits")]);
    }

    #[test]
    fn marks_every_case_insensitive_occurrence() {
        let segments = highlight("SQL injection and sql", "sql");
        assert_eq!(
            segments,
            vec![
                HighlightSegment::marked("SQL"),
                HighlightSegment::plain(" injection and "),
                HighlightSegment::marked("sql"),
            ]
        );
    }

    #[test]
    fn earlier_terms_win_overlaps() {
        let segments = highlight("overflowing", "overflow flowing");
        assert_eq!(segments, vec![HighlightSegment::marked("overflow"), HighlightSegment::plain("ing")]);
        assert_eq!(joined(&segments), "overflowing");
    }

    #[test]
    fn unmatched_text_is_untouched() {
        let segments = highlight("Privilege escalation", "kernel");
        assert_eq!(segments, vec![HighlightSegment::plain("Privilege escalation")]);
    }

    #[test]
    fn regex_metacharacters_in_text_are_literal() {
        let segments = highlight("use c++ (really)", "really");
        assert_eq!(joined(&segments), "use c++ (really)");
        assert!(segments.iter().any(|s| s.highlighted && s.text == "really"));
    }
}
