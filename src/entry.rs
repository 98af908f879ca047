//! Log entry record, draft, validation, and delimited-list codecs.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    types::EntryId,
};

/// Delimiter used when list fields are stored as a single string.
///
/// Items that themselves contain the delimiter do not round-trip; category tags
/// containing it are rejected at validation, equipment items are split.
pub const LIST_DELIMITER: char = ',';

/// Fully materialized, immutable log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Store-assigned identifier.
    pub id: EntryId,
    /// Free-text narrative.
    pub content: Option<String>,
    /// Site name.
    pub site: String,
    /// Area or region.
    pub area: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// Maximum depth in meters.
    pub depth_max: f64,
    /// Average depth in meters.
    pub depth_avg: Option<f64>,
    /// Bottom time in minutes.
    pub duration_minutes: u32,
    /// Category tags, at least one.
    pub category: Vec<String>,
    /// Notable features of the dive.
    pub highlights: Option<String>,
    /// Calendar date of the dive.
    pub date: NaiveDate,
    /// Clock time of the dive.
    pub time: NaiveTime,
    /// Equipment item names, in order.
    pub equipment: Vec<String>,
}

/// Insert payload used to create a new [`LogEntry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDraft {
    /// Free-text narrative.
    #[serde(default)]
    pub content: Option<String>,
    /// Site name.
    pub site: String,
    /// Area or region.
    #[serde(default)]
    pub area: Option<String>,
    /// Country.
    #[serde(default)]
    pub country: Option<String>,
    /// Maximum depth in meters.
    pub depth_max: f64,
    /// Average depth in meters.
    #[serde(default)]
    pub depth_avg: Option<f64>,
    /// Bottom time in minutes.
    pub duration_minutes: u32,
    /// Category tags, at least one.
    pub category: Vec<String>,
    /// Notable features of the dive.
    #[serde(default)]
    pub highlights: Option<String>,
    /// Calendar date of the dive.
    pub date: NaiveDate,
    /// Clock time of the dive.
    pub time: NaiveTime,
    /// Equipment item names, in order.
    #[serde(default)]
    pub equipment: Vec<String>,
}

impl EntryDraft {
    /// Draft with the required fields set and every optional field empty.
    pub fn new(
        site: impl Into<String>,
        date: NaiveDate,
        time: NaiveTime,
        depth_max: f64,
        duration_minutes: u32,
        category: Vec<String>,
    ) -> Self {
        Self {
            content: None,
            site: site.into(),
            area: None,
            country: None,
            depth_max,
            depth_avg: None,
            duration_minutes,
            category,
            highlights: None,
            date,
            time,
            equipment: Vec::new(),
        }
    }

    /// Checks required fields before anything is written.
    pub fn validate(&self) -> Result<()> {
        if self.site.trim().is_empty() {
            return Err(Error::validation("site", "must not be empty"));
        }
        if !self.depth_max.is_finite() || self.depth_max < 0.0 {
            return Err(Error::validation(
                "depth_max",
                format!("must be a non-negative number, got {}", self.depth_max),
            ));
        }
        if let Some(avg) = self.depth_avg {
            if !avg.is_finite() || avg < 0.0 {
                return Err(Error::validation(
                    "depth_avg",
                    format!("must be a non-negative number, got {avg}"),
                ));
            }
        }
        if self.category.is_empty() {
            return Err(Error::validation("category", "at least one tag is required"));
        }
        for tag in &self.category {
            if tag.trim().is_empty() {
                return Err(Error::validation("category", "tags must not be empty"));
            }
            if tag.contains(LIST_DELIMITER) {
                return Err(Error::validation(
                    "category",
                    format!("tag {tag:?} contains the list delimiter"),
                ));
            }
        }
        Ok(())
    }

    /// Materializes the draft under a freshly assigned id.
    pub fn into_entry(self, id: EntryId) -> LogEntry {
        LogEntry {
            id,
            content: self.content,
            site: self.site,
            area: self.area,
            country: self.country,
            depth_max: self.depth_max,
            depth_avg: self.depth_avg,
            duration_minutes: self.duration_minutes,
            category: self.category,
            highlights: self.highlights,
            date: self.date,
            time: self.time,
            equipment: self.equipment,
        }
    }
}

impl LogEntry {
    /// Text-bearing fields fed to the text index, in a fixed order.
    pub fn indexed_text(&self) -> [Option<&str>; 5] {
        [
            self.content.as_deref(),
            Some(self.site.as_str()),
            self.area.as_deref(),
            self.country.as_deref(),
            self.highlights.as_deref(),
        ]
    }

    /// Case-folded category tags as matched by filters.
    pub fn normalized_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.category.iter().map(|t| normalize_tag(t)).collect();
        tags.sort();
        tags.dedup();
        tags
    }
}

/// Case-folds and trims a category tag for comparison.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Joins list items into the stored delimited form; `None` for an empty list.
pub fn encode_list(items: &[String]) -> Option<String> {
    if items.is_empty() {
        None
    } else {
        Some(items.join(LIST_DELIMITER.to_string().as_str()))
    }
}

/// Splits the stored delimited form back into items.
pub fn decode_list(stored: Option<&str>) -> Vec<String> {
    match stored {
        None => Vec::new(),
        Some(s) => s.split(LIST_DELIMITER).map(str::to_string).collect(),
    }
}

/// Parses a `YYYY-MM-DD` date string.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::validation("date", "must not be empty"));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| Error::validation("date", format!("{raw:?} is not YYYY-MM-DD: {e}")))
}

/// Parses an `HH:MM` or `HH:MM:SS` 24-hour clock time.
pub fn parse_time(raw: &str) -> Result<NaiveTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::validation("time", "must not be empty"));
    }
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|e| Error::validation("time", format!("{raw:?} is not HH:MM: {e}")))
}
