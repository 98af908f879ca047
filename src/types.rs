//! Shared primitive IDs and filterable field enums.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, immutable log entry identifier.
///
/// Assigned once by the store at creation time and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Generates a fresh random identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Entry fields that structured filters can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Country of the site.
    Country,
    /// Area or region of the site.
    Area,
    /// Site name.
    Site,
    /// Category tags (multi-valued, case-insensitive).
    Category,
    /// Maximum depth reached.
    DepthMax,
}

impl Field {
    /// True for fields compared as numbers.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::DepthMax)
    }

    /// Stable lowercase name used in messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Area => "area",
            Self::Site => "site",
            Self::Category => "category",
            Self::DepthMax => "depth_max",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which planner path produced a search hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitSource {
    /// Structured filter scan; score is neutral.
    Filter,
    /// Ranked text index lookup.
    Text,
}

impl rusqlite::ToSql for EntryId {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(rusqlite::types::ToSqlOutput::from(self.0.to_string()))
    }
}

impl rusqlite::types::FromSql for EntryId {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        let raw = value.as_str()?;
        raw.parse()
            .map_err(|e| rusqlite::types::FromSqlError::Other(Box::new(e)))
    }
}

/// Last-write-wins key/value preference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preference {
    /// Unique key.
    pub key: String,
    /// Current value.
    pub value: String,
    /// Time of the most recent write.
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
