//! BM25 relevance scoring.
//!
//! For each query term `t` present in a document:
//!
//! ```text
//! score += IDF(t) * (tf * (k1 + 1)) / (tf + k1 * (1 - b + b * dl / avgdl))
//! IDF(t) = ln((N - df + 0.5) / (df + 0.5) + 1)
//! ```
//!
//! The smoothed IDF is always positive, so every matching document scores
//! above zero and higher always means more relevant. Neutral (match-all)
//! results carry a score of exactly `0.0`.

use serde::{Deserialize, Serialize};

/// Tunable BM25 constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f64,
    /// Document-length normalization, in `[0, 1]`.
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

/// Corpus statistics captured once per ranked search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorpusStats {
    /// Number of indexed entries.
    pub total_docs: u64,
    /// Mean indexed token count per entry.
    pub avg_doc_len: f64,
}

impl Bm25Params {
    /// True when both constants are finite and in range.
    pub fn is_valid(&self) -> bool {
        self.k1.is_finite() && self.k1 >= 0.0 && self.b.is_finite() && (0.0..=1.0).contains(&self.b)
    }

    /// Smoothed inverse document frequency.
    pub fn idf(&self, stats: &CorpusStats, doc_freq: u64) -> f64 {
        let n = stats.total_docs as f64;
        let df = doc_freq as f64;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// Contribution of one term occurring `tf` times in a `doc_len`-token entry.
    pub fn term_score(&self, idf: f64, tf: u32, doc_len: u32, stats: &CorpusStats) -> f64 {
        let tf = f64::from(tf);
        let avg = if stats.avg_doc_len > 0.0 {
            stats.avg_doc_len
        } else {
            1.0
        };
        let norm = 1.0 - self.b + self.b * f64::from(doc_len) / avg;
        idf * (tf * (self.k1 + 1.0)) / (tf + self.k1 * norm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> CorpusStats {
        CorpusStats {
            total_docs: 100,
            avg_doc_len: 20.0,
        }
    }

    #[test]
    fn rare_terms_weigh_more() {
        let p = Bm25Params::default();
        assert!(p.idf(&stats(), 1) > p.idf(&stats(), 50));
        assert!(p.idf(&stats(), 100) > 0.0);
    }

    #[test]
    fn term_frequency_saturates() {
        let p = Bm25Params::default();
        let idf = p.idf(&stats(), 5);
        let one = p.term_score(idf, 1, 20, &stats());
        let two = p.term_score(idf, 2, 20, &stats());
        let ten = p.term_score(idf, 10, 20, &stats());
        assert!(two > one);
        assert!(ten > two);
        assert!(ten < idf * (p.k1 + 1.0));
    }

    #[test]
    fn shorter_documents_score_higher() {
        let p = Bm25Params::default();
        let idf = p.idf(&stats(), 5);
        assert!(p.term_score(idf, 1, 5, &stats()) > p.term_score(idf, 1, 80, &stats()));
    }

    #[test]
    fn param_validation() {
        assert!(Bm25Params::default().is_valid());
        assert!(!Bm25Params { k1: 1.2, b: 1.5 }.is_valid());
        assert!(!Bm25Params { k1: f64::NAN, b: 0.5 }.is_valid());
    }
}
