//! Embedded dive log store with hybrid text + structured search.
//!
//! Entries live in SQLite next to a derived inverted index that is written in
//! the same transaction as each entry. Searches combine BM25 text relevance
//! with exact-match filters and merge the two under a recall-first policy.
//!
//! # Examples
//!
//! ```
//! use chrono::{NaiveDate, NaiveTime};
//! use divelog::{
//!     engine::SearchRequest,
//!     entry::EntryDraft,
//!     filter::FilterSet,
//!     persist::LogStore,
//! };
//!
//! let mut store = LogStore::open_in_memory().expect("open");
//! let mut draft = EntryDraft::new(
//!     "Blue Corner",
//!     NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
//!     NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
//!     30.0,
//!     50,
//!     vec!["wall".to_string()],
//! );
//! draft.country = Some("Palau".to_string());
//! draft.highlights = Some("reef sharks, barracuda".to_string());
//! let id = store.create(draft).expect("create");
//!
//! let by_country = store
//!     .search(&SearchRequest::filtered(FilterSet {
//!         country: Some("Palau".to_string()),
//!         ..FilterSet::default()
//!     }))
//!     .expect("search");
//! assert_eq!(by_country[0].entry.id, id);
//!
//! let by_text = store.search(&SearchRequest::text("sharks")).expect("search");
//! assert!(by_text[0].score > 0.0);
//! ```
//!
//! Importing a legacy JSON export into a file-backed store:
//! ```no_run
//! use divelog::{import::import_json, persist::LogStore};
//!
//! let mut store = LogStore::open("divelog.db").expect("open sqlite");
//! let file = std::fs::File::open("sample_dives.json").expect("open json");
//! let report = import_json(&mut store, file).expect("import");
//! println!("{} imported, {} rejected", report.inserted.len(), report.failures.len());
//! ```
#![deny(missing_docs)]

/// Store configuration.
pub mod config;
/// Tokenizer, relevance scoring, and text index tables.
pub mod core;
/// Query planner and result merger.
pub mod engine;
/// Log entry records and drafts.
pub mod entry;
/// Error taxonomy.
pub mod error;
/// Structured filter criteria and predicates.
pub mod filter;
/// Batch importer for legacy JSON exports.
pub mod import;
/// SQLite record store.
pub mod persist;
/// Shared primitive IDs and enums.
pub mod types;

pub use error::{Error, ErrorKind, Result};
