//! Store configuration.

use serde::{Deserialize, Serialize};

use crate::{
    core::scorer::Bm25Params,
    error::{Error, Result},
};

/// How the combined (filter + text) planner path joins its two result lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Union of both paths, filter matches first.
    #[default]
    Union,
    /// Text ranking restricted to entries that satisfy the filters.
    Intersect,
}

/// Tunables for a [`crate::persist::sqlite::LogStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Use WAL journaling with `synchronous=NORMAL` for file-backed stores.
    pub wal: bool,
    /// How long a writer waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
    /// Result cap applied when a search request does not set one.
    pub default_limit: usize,
    /// Upper bound on any requested result cap.
    pub max_limit: usize,
    /// Relevance scoring constants.
    pub bm25: Bm25Params,
    /// Combined-path merge behavior.
    pub merge_policy: MergePolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            wal: true,
            busy_timeout_ms: 5_000,
            default_limit: 10,
            max_limit: 500,
            bm25: Bm25Params::default(),
            merge_policy: MergePolicy::Union,
        }
    }
}

impl StoreConfig {
    /// Parses a JSON config; absent keys take their defaults.
    pub fn from_json(raw: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects limits and scoring constants that cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.default_limit == 0 {
            return Err(Error::validation("default_limit", "must be at least 1"));
        }
        if self.max_limit < self.default_limit {
            return Err(Error::validation(
                "max_limit",
                format!("{} is below default_limit {}", self.max_limit, self.default_limit),
            ));
        }
        if !self.bm25.is_valid() {
            return Err(Error::validation(
                "bm25",
                format!("k1={} b={} out of range", self.bm25.k1, self.bm25.b),
            ));
        }
        Ok(())
    }
}
