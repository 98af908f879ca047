//! Result merger for the combined planner path.
//!
//! Filter matches are exact structural hits and are never displaced by fuzzy
//! text matches: they are emitted first, in recency order, and an id present
//! in both lists keeps its filter-path position.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::{entry::LogEntry, types::HitSource};

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// The matching entry.
    pub entry: LogEntry,
    /// Relevance score; `0.0` for filter and match-all hits.
    pub score: f64,
    /// Path that produced the hit.
    pub source: HitSource,
}

impl SearchHit {
    /// Neutral-score hit from the filter path.
    pub fn filtered(entry: LogEntry) -> Self {
        Self {
            entry,
            score: 0.0,
            source: HitSource::Filter,
        }
    }

    /// Scored hit from the text path.
    pub fn ranked(entry: LogEntry, score: f64) -> Self {
        Self {
            entry,
            score,
            source: HitSource::Text,
        }
    }
}

/// Unions two capped result lists into one list of at most `limit` hits.
///
/// Output is the filter hits in their given order, then the text hits not
/// already present, in their given (descending relevance) order. No id
/// appears twice.
pub fn merge(filter_hits: Vec<SearchHit>, text_hits: Vec<SearchHit>, limit: usize) -> Vec<SearchHit> {
    let mut seen = HashSet::with_capacity(filter_hits.len() + text_hits.len());
    filter_hits
        .into_iter()
        .chain(text_hits)
        .filter(|hit| seen.insert(hit.entry.id))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;
    use crate::{entry::EntryDraft, types::EntryId};

    fn entry(site: &str) -> LogEntry {
        EntryDraft::new(
            site,
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            20.0,
            40,
            vec!["reef".to_string()],
        )
        .into_entry(EntryId::new_random())
    }

    fn sites(hits: &[SearchHit]) -> Vec<&str> {
        hits.iter().map(|h| h.entry.site.as_str()).collect()
    }

    #[test]
    fn filter_hits_come_first_and_win_duplicates() {
        let a = entry("A");
        let b = entry("B");
        let c = entry("C");

        let merged = merge(
            vec![SearchHit::filtered(a.clone()), SearchHit::filtered(b.clone())],
            vec![SearchHit::ranked(c, 3.0), SearchHit::ranked(a, 2.0)],
            10,
        );
        assert_eq!(sites(&merged), vec!["A", "B", "C"]);
        assert_eq!(merged[0].source, HitSource::Filter);
        assert_eq!(merged[0].score, 0.0);
        assert_eq!(merged[2].source, HitSource::Text);
    }

    #[test]
    fn truncates_after_union() {
        let filter: Vec<_> = ["F1", "F2", "F3"].iter().map(|s| SearchHit::filtered(entry(s))).collect();
        let text: Vec<_> = ["T1", "T2"].iter().map(|s| SearchHit::ranked(entry(s), 1.0)).collect();
        let merged = merge(filter, text, 4);
        assert_eq!(sites(&merged), vec!["F1", "F2", "F3", "T1"]);
    }

    #[test]
    fn text_only_duplicates_are_collapsed() {
        let a = entry("A");
        let merged = merge(
            vec![],
            vec![SearchHit::ranked(a.clone(), 2.0), SearchHit::ranked(a, 1.0)],
            10,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].score, 2.0);
    }

    #[test]
    fn empty_inputs_merge_to_empty() {
        assert!(merge(vec![], vec![], 5).is_empty());
    }
}
