//! Batch import of dive records from a JSON array.
//!
//! Records use the field names of the legacy dive-log export:
//!
//! ```json
//! [{
//!   "date": "2024-03-15", "time": "09:30", "max_depth": 30,
//!   "dive_type": "wall,drift", "location_site": "Blue Corner",
//!   "dive_length": 50, "location_country": "Palau"
//! }]
//! ```
//!
//! Each record is created independently; one bad record does not stop the rest.

use std::io::Read;

use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    entry::{EntryDraft, LIST_DELIMITER, parse_date, parse_time},
    error::{Error, Result},
    persist::sqlite::LogStore,
    types::EntryId,
};

/// One record in the legacy export format.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImportRecord {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM` or `HH:MM:SS`.
    pub time: String,
    /// Maximum depth in meters.
    pub max_depth: f64,
    /// One tag or comma-separated tags.
    pub dive_type: String,
    /// Site name.
    pub location_site: String,
    /// Bottom time in minutes.
    pub dive_length: u32,
    /// Area or region.
    #[serde(default)]
    pub location_area: Option<String>,
    /// Country.
    #[serde(default)]
    pub location_country: Option<String>,
    /// Notable features.
    #[serde(default)]
    pub highlights: Option<String>,
    /// Narrative.
    #[serde(default)]
    pub content: Option<String>,
    /// Average depth in meters.
    #[serde(default)]
    pub depth_avg: Option<f64>,
    /// Equipment items.
    #[serde(default)]
    pub equipment_used: Option<Vec<String>>,
}

impl TryFrom<ImportRecord> for EntryDraft {
    type Error = Error;

    fn try_from(rec: ImportRecord) -> Result<Self> {
        let category = rec
            .dive_type
            .split(LIST_DELIMITER)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        Ok(Self {
            content: rec.content,
            site: rec.location_site,
            area: rec.location_area,
            country: rec.location_country,
            depth_max: rec.max_depth,
            depth_avg: rec.depth_avg,
            duration_minutes: rec.dive_length,
            category,
            highlights: rec.highlights,
            date: parse_date(&rec.date)?,
            time: parse_time(&rec.time)?,
            equipment: rec.equipment_used.unwrap_or_default(),
        })
    }
}

/// A record that could not be imported.
#[derive(Debug)]
pub struct ImportFailure {
    /// Zero-based position in the input array.
    pub index: usize,
    /// Why it was rejected.
    pub error: Error,
}

/// Outcome of an import run.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Ids of created entries, in input order.
    pub inserted: Vec<EntryId>,
    /// Rejected records.
    pub failures: Vec<ImportFailure>,
}

/// Imports every record of a JSON array read from `reader`.
///
/// Fails as a whole only when the input is not a JSON array; per-record
/// problems (missing keys, bad dates, validation, storage) land in
/// [`ImportReport::failures`].
pub fn import_json<R: Read>(store: &mut LogStore, reader: R) -> Result<ImportReport> {
    let raw: Vec<serde_json::Value> = serde_json::from_reader(reader)?;
    let mut report = ImportReport::default();

    for (index, value) in raw.into_iter().enumerate() {
        let outcome = serde_json::from_value::<ImportRecord>(value)
            .map_err(Error::from)
            .and_then(EntryDraft::try_from)
            .and_then(|draft| store.create(draft));
        match outcome {
            Ok(id) => report.inserted.push(id),
            Err(error) => {
                warn!(target: "divelog::import", index, %error, "record rejected");
                report.failures.push(ImportFailure { index, error });
            }
        }
    }

    info!(
        target: "divelog::import",
        inserted = report.inserted.len(),
        failed = report.failures.len(),
        "import finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;
    use crate::error::ErrorKind;

    fn record() -> ImportRecord {
        serde_json::from_str(
            r#"{"date": "2024-03-15", "time": "09:30", "max_depth": 30,
                "dive_type": "wall, drift", "location_site": "Blue Corner",
                "dive_length": 50, "equipment_used": ["BCD", "reef hook"]}"#,
        )
        .unwrap()
    }

    #[test]
    fn converts_legacy_fields() {
        let draft = EntryDraft::try_from(record()).unwrap();
        assert_eq!(draft.site, "Blue Corner");
        assert_eq!(draft.category, vec!["wall", "drift"]);
        assert_eq!(draft.date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(draft.time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(draft.equipment, vec!["BCD", "reef hook"]);
        assert_eq!(draft.country, None);
    }

    #[test]
    fn bad_time_is_a_validation_error() {
        let mut rec = record();
        rec.time = "half nine".to_string();
        let err = EntryDraft::try_from(rec).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
