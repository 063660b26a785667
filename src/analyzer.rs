//! Keyword frequency over decision summaries.

use crate::types::{KeywordFrequency, RecordSet};

/// Split a comma-separated keyword string into trimmed, lower-cased terms.
/// Empty pieces are dropped; order and duplicates are kept.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Non-overlapping occurrences of `needle` in `haystack`, scanning left to
/// right. `"aa"` occurs twice in `"aaaa"`, not three times.
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

/// Count each keyword across every summary, compared in lower case.
pub fn term_frequencies(records: &RecordSet, keywords: &[String]) -> Vec<KeywordFrequency> {
    let summaries: Vec<String> = records
        .iter()
        .map(|record| record.summary_text.to_lowercase())
        .collect();

    keywords
        .iter()
        .map(|term| KeywordFrequency {
            term: term.clone(),
            count: summaries
                .iter()
                .map(|summary| count_occurrences(summary, term))
                .sum(),
        })
        .collect()
}

/// Parse a raw keyword string and count it in one step
pub fn analyze(records: &RecordSet, raw_keywords: &str) -> Vec<KeywordFrequency> {
    term_frequencies(records, &parse_keywords(raw_keywords))
}
