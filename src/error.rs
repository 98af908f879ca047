//! Error taxonomy surfaced by every store and search operation.
//!
//! Failures are never swallowed or retried inside the crate: the store, text
//! index, and planner all return these variants unchanged to the caller.

use thiserror::Error;

use crate::{filter::QueryError, types::EntryId};

/// Result alias for divelog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse failure category, stable for callers that branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required field was missing or malformed.
    Validation,
    /// Lookup by an unknown id.
    NotFound,
    /// I/O or transaction failure in SQLite.
    Storage,
    /// Malformed filter combination or limit.
    Query,
    /// Import input could not be decoded.
    Decode,
}

/// Error type for divelog operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A required field is missing, empty, or malformed.
    #[error("invalid {field}: {reason}")]
    Validation {
        /// Offending field name.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// No entry with this id exists.
    #[error("entry not found: {0}")]
    NotFound(EntryId),

    /// The underlying engine failed; the enclosing transaction was rolled back.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// The filter set or limit was rejected before touching storage.
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    /// Import document is not the expected JSON shape.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Returns the failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Query(_) => ErrorKind::Query,
            Self::Decode(_) => ErrorKind::Decode,
        }
    }
}
