//! Tokenizer shared by the index write path and query parsing.
//!
//! Text is split on whitespace and commas, surrounding punctuation is
//! stripped, and tokens are lowercased. Indexing and querying must agree on
//! this exactly or terms will silently stop matching.

use hashbrown::HashSet;

/// Token that, alone, means "match every entry".
pub const WILDCARD: &str = "*";

/// Splits `text` into normalized terms, keeping duplicates.
///
/// ```
/// use divelog::core::tokenizer::tokenize;
///
/// assert_eq!(tokenize("Reef sharks, (mantas)!"), vec!["reef", "sharks", "mantas"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .map(|raw| raw.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Distinct query terms in first-seen order.
pub fn query_terms(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(query)
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// True when the query carries no usable terms: empty, a lone wildcard, or
/// nothing but punctuation.
pub fn is_match_all(query: &str) -> bool {
    let trimmed = query.trim();
    trimmed.is_empty() || trimmed == WILDCARD || tokenize(trimmed).is_empty()
}
