//! Durable record store over SQLite.
//!
//! [`sqlite::LogStore`] owns the entries table, the preference table, and the
//! derived text index tables. It is an explicit handle: open as many
//! independent stores as needed, each over its own file or in-memory database.

/// SQLite-backed record store.
pub mod sqlite;

pub use sqlite::LogStore;
