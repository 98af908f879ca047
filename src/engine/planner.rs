//! Hybrid search planner.
//!
//! The planner is state-free. It inspects a [`SearchRequest`] and picks one of
//! three paths:
//!
//! | text query | filters | path |
//! |---|---|---|
//! | absent, empty, or `*` | present | [`SearchPath::FilterOnly`] |
//! | anything | absent | [`SearchPath::TextOnly`] (match-all when the text is empty) |
//! | meaningful | present | [`SearchPath::Combined`] |
//!
//! The combined path runs both other paths independently, each capped at the
//! limit, and unions them with [`crate::engine::merge`]. A conversational
//! caller often repeats one location token across several filter fields; the
//! union keeps those requests from collapsing to nothing. With
//! [`MergePolicy::Intersect`] the filter matches instead restrict the text
//! ranking.

use hashbrown::HashSet;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::{MergePolicy, StoreConfig},
    core::{text_index, tokenizer::is_match_all},
    engine::merge::{SearchHit, merge},
    error::Result,
    filter::{FilterSet, Predicate, QueryError},
    persist::sqlite::{filter_scan, load_entry},
    types::EntryId,
};

/// Free text plus structured filters plus a result cap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text query; empty or `*` means "no text query".
    #[serde(default)]
    pub query: Option<String>,
    /// Structured criteria.
    #[serde(default)]
    pub filters: FilterSet,
    /// Result cap; the store's default when absent.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SearchRequest {
    /// Text-only request.
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    /// Filter-only request.
    pub fn filtered(filters: FilterSet) -> Self {
        Self {
            filters,
            ..Self::default()
        }
    }

    /// Sets the text query.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Sets the result cap.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True when the text query carries at least one usable term.
    pub fn has_text(&self) -> bool {
        self.query.as_deref().is_some_and(|q| !is_match_all(q))
    }

    /// Path this request will take.
    pub fn path(&self) -> SearchPath {
        match (self.has_text(), self.filters.is_empty()) {
            (false, false) => SearchPath::FilterOnly,
            (_, true) => SearchPath::TextOnly,
            (true, false) => SearchPath::Combined,
        }
    }
}

/// Execution strategy chosen for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPath {
    /// Structured scan only, newest first.
    FilterOnly,
    /// Text ranking only; match-all when there is no usable text.
    TextOnly,
    /// Both, merged under the configured policy.
    Combined,
}

/// Resolves the requested cap against the store's defaults.
pub fn effective_limit(requested: Option<usize>, config: &StoreConfig) -> Result<usize> {
    match requested {
        Some(0) => Err(QueryError::InvalidLimit.into()),
        Some(n) => Ok(n.min(config.max_limit)),
        None => Ok(config.default_limit),
    }
}

pub(crate) fn execute(
    conn: &Connection,
    config: &StoreConfig,
    request: &SearchRequest,
) -> Result<Vec<SearchHit>> {
    let limit = effective_limit(request.limit, config)?;
    let predicate = request.filters.build()?;
    let query = request.query.as_deref().unwrap_or("");
    let path = request.path();

    debug!(
        target: "divelog::search",
        ?path,
        limit,
        policy = ?config.merge_policy,
        "planning search"
    );

    let hits = match (path, predicate) {
        // No usable filters: text ranking, or match-all for an empty query.
        (SearchPath::TextOnly, _) => text_hits(conn, config, query, None, limit)?,
        (SearchPath::FilterOnly, Some(predicate)) => filter_hits(conn, &predicate, Some(limit))?,
        (SearchPath::Combined, Some(predicate)) => match config.merge_policy {
            MergePolicy::Union => {
                let by_filter = filter_hits(conn, &predicate, Some(limit))?;
                let by_text = text_hits(conn, config, query, None, limit)?;
                merge(by_filter, by_text, limit)
            }
            MergePolicy::Intersect => {
                let candidates: HashSet<EntryId> = filter_scan(conn, &predicate, None)?
                    .into_iter()
                    .map(|e| e.id)
                    .collect();
                text_hits(conn, config, query, Some(&candidates), limit)?
            }
        },
        (SearchPath::FilterOnly | SearchPath::Combined, None) => {
            return Err(QueryError::EmptyGroup.into());
        }
    };

    debug!(target: "divelog::search", ?path, hits = hits.len(), "search complete");
    Ok(hits)
}

fn filter_hits(conn: &Connection, predicate: &Predicate, limit: Option<usize>) -> Result<Vec<SearchHit>> {
    Ok(filter_scan(conn, predicate, limit)?
        .into_iter()
        .map(SearchHit::filtered)
        .collect())
}

fn text_hits(
    conn: &Connection,
    config: &StoreConfig,
    query: &str,
    candidates: Option<&HashSet<EntryId>>,
    limit: usize,
) -> Result<Vec<SearchHit>> {
    text_index::ranked_search(conn, query, candidates, limit, &config.bm25)?
        .into_iter()
        .map(|scored| Ok(SearchHit::ranked(load_entry(conn, &scored.id)?, scored.score)))
        .collect()
}
