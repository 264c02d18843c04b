use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

/// Case-insensitive matcher for the words of the active search phrase.
pub fn search_highlighter(search: &str) -> Option<Regex> {
    let mut words = Vec::new();
    let mut seen = HashSet::new();
    for word in search.split_whitespace() {
        if seen.insert(word.to_lowercase()) {
            words.push(word);
        }
    }
    if words.is_empty() {
        return None;
    }
    words.sort_by(|a, b| b.len().cmp(&a.len()));
    let pattern = words
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .ok()
}
