//! Comma-separated token handling shared by tag strings, person strings and
//! query parameters.

/// Splits `input` on commas, trimming and lower-casing each token and
/// dropping the empty ones.
pub fn parse_csv(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

pub fn parse_optional_csv(input: Option<&str>) -> Vec<String> {
    input.map(parse_csv).unwrap_or_default()
}

pub fn join_tokens<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(|token| token.as_ref())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Case-insensitive membership test against an already normalized list.
pub fn contains_token(tokens: &[String], needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    tokens.iter().any(|token| *token == needle)
}
