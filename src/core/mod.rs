//! Text index internals: tokenization, relevance scoring, and index tables.

/// BM25 relevance scoring.
pub mod scorer;
/// Derived inverted index kept in lockstep with the entries table.
pub mod text_index;
/// Whitespace/comma tokenizer shared by indexing and querying.
pub mod tokenizer;
