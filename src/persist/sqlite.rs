//! SQLite-backed record store with a transactional index write path.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Utc};
use hashbrown::HashSet;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params, types::Type};
use tracing::{debug, info};

use crate::{
    config::StoreConfig,
    core::text_index::{self, ScoredEntry},
    engine::{SearchHit, SearchRequest, planner},
    entry::{EntryDraft, LogEntry, decode_list, encode_list},
    error::{Error, Result},
    filter::Predicate,
    types::{EntryId, Preference},
};

/// Column list matching [`entry_from_row`], over the `e` alias.
pub(crate) const ENTRY_COLUMNS: &str = "e.id, e.content, e.site, e.area, e.country, \
     e.depth_max, e.depth_avg, e.duration_minutes, e.category, e.highlights, \
     e.date_days, e.time_secs, e.time_nanos, e.equipment";

/// Recency order: date and time descending, insertion order ascending.
pub(crate) const RECENCY_ORDER: &str =
    "ORDER BY e.date_days DESC, e.time_secs DESC, e.time_nanos DESC, e.seq ASC";

/// Durable log entry store.
///
/// Writes (`create`, `upsert_preference`) take `&mut self` and run inside an
/// immediate transaction, so SQLite serializes them against other handles on
/// the same file. Reads take `&self`. With WAL enabled, separate handles on one
/// file read concurrently and see either the pre- or post-commit state of any
/// write.
pub struct LogStore {
    conn: Connection,
    config: StoreConfig,
}

impl LogStore {
    /// Opens or creates a store at `path` with default configuration.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, StoreConfig::default())
    }

    /// Opens or creates a store at `path`.
    pub fn open_with_config(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
        let path = path.as_ref();
        config.validate()?;
        let conn = Connection::open(path)?;
        let store = Self::init_connection(conn, config, true)?;
        info!(
            target: "divelog::store",
            path = %path.display(),
            entries = store.count()?,
            "log store opened"
        );
        Ok(store)
    }

    /// Opens a private in-memory store with default configuration.
    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with_config(StoreConfig::default())
    }

    /// Opens a private in-memory store.
    pub fn open_in_memory_with_config(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn, config, false)
    }

    fn init_connection(conn: Connection, config: StoreConfig, file_backed: bool) -> Result<Self> {
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        if file_backed && config.wal {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
        }
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn, config })
    }

    /// Active configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Validates and persists a new entry together with its index rows.
    ///
    /// The entry row, its category tags, and its text index rows are written
    /// in one transaction; on any failure none of them become visible.
    pub fn create(&mut self, draft: EntryDraft) -> Result<EntryId> {
        draft.validate()?;
        let entry = draft.into_entry(EntryId::new_random());

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let seq = insert_entry(&tx, &entry)?;
        text_index::index_entry(&tx, seq, &entry)?;
        tx.commit()?;

        debug!(target: "divelog::store", id = %entry.id, seq, site = %entry.site, "entry created");
        Ok(entry.id)
    }

    /// Fetches one entry.
    pub fn get_by_id(&self, id: &EntryId) -> Result<LogEntry> {
        load_entry(&self.conn, id)
    }

    /// All entries, newest first; equal date and time keep insertion order.
    pub fn get_all(&self) -> Result<Vec<LogEntry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries e {RECENCY_ORDER}");
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map([], entry_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Number of stored entries.
    pub fn count(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    /// Sets `key` to `value`, replacing any previous value and timestamp.
    pub fn upsert_preference(&mut self, key: &str, value: &str) -> Result<()> {
        if key.trim().is_empty() {
            return Err(Error::validation("key", "must not be empty"));
        }
        let now = Utc::now();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO preferences(key, value, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now.to_rfc3339()],
        )?;
        tx.commit()?;
        debug!(target: "divelog::store", key, "preference saved");
        Ok(())
    }

    /// One preference with its write timestamp, if set.
    pub fn get_preference(&self, key: &str) -> Result<Option<Preference>> {
        let pref = self
            .conn
            .query_row(
                "SELECT key, value, updated_at FROM preferences WHERE key = ?1",
                params![key],
                preference_from_row,
            )
            .optional()?;
        Ok(pref)
    }

    /// Snapshot of every preference as `key -> value`.
    pub fn get_all_preferences(&self) -> Result<BTreeMap<String, String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT key, value FROM preferences")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut out = BTreeMap::new();
        for row in rows {
            let (k, v) = row?;
            out.insert(k, v);
        }
        Ok(out)
    }

    /// Ranks entries against `query_text`, optionally restricted to `candidates`.
    ///
    /// `limit` follows the same rules as a search request: zero is rejected
    /// and values above the configured maximum are clamped.
    pub fn ranked_search(
        &self,
        query_text: &str,
        candidates: Option<&HashSet<EntryId>>,
        limit: usize,
    ) -> Result<Vec<ScoredEntry>> {
        let limit = planner::effective_limit(Some(limit), &self.config)?;
        Ok(text_index::ranked_search(
            &self.conn,
            query_text,
            candidates,
            limit,
            &self.config.bm25,
        )?)
    }

    /// Runs a hybrid search; see [`crate::engine::planner`] for routing.
    pub fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
        // One read transaction so both planner paths see the same snapshot.
        let snapshot = self.conn.unchecked_transaction()?;
        let hits = planner::execute(&snapshot, &self.config, request)?;
        snapshot.finish()?;
        Ok(hits)
    }

    /// Number of entries carrying an index document; equals [`Self::count`].
    pub fn indexed_count(&self) -> Result<u64> {
        Ok(text_index::indexed_count(&self.conn)?)
    }
}

fn insert_entry(conn: &Connection, entry: &LogEntry) -> Result<i64> {
    conn.execute(
        "INSERT INTO entries(id, content, site, area, country, depth_max, depth_avg, \
         duration_minutes, category, highlights, date_days, time_secs, time_nanos, equipment) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            entry.id,
            entry.content,
            entry.site,
            entry.area,
            entry.country,
            entry.depth_max,
            entry.depth_avg,
            entry.duration_minutes,
            encode_list(&entry.category),
            entry.highlights,
            entry.date.num_days_from_ce(),
            entry.time.num_seconds_from_midnight(),
            entry.time.nanosecond(),
            encode_list(&entry.equipment),
        ],
    )?;
    let seq = conn.last_insert_rowid();

    let mut stmt = conn.prepare_cached("INSERT INTO entry_tags(tag, entry_seq) VALUES (?1, ?2)")?;
    for tag in entry.normalized_tags() {
        stmt.execute(params![tag, seq])?;
    }
    Ok(seq)
}

/// Loads one entry by id.
pub(crate) fn load_entry(conn: &Connection, id: &EntryId) -> Result<LogEntry> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries e WHERE e.id = ?1");
    conn.prepare_cached(&sql)?
        .query_row(params![id], entry_from_row)
        .optional()?
        .ok_or(Error::NotFound(*id))
}

/// Entries satisfying `predicate`, newest first, capped at `limit` when given.
pub(crate) fn filter_scan(
    conn: &Connection,
    predicate: &Predicate,
    limit: Option<usize>,
) -> Result<Vec<LogEntry>> {
    let mut sql = format!("SELECT {ENTRY_COLUMNS} FROM entries e WHERE ");
    let mut values = Vec::new();
    predicate.write_sql(&mut sql, &mut values);
    sql.push(' ');
    sql.push_str(RECENCY_ORDER);
    if let Some(limit) = limit {
        sql.push_str(" LIMIT ?");
        values.push(rusqlite::types::Value::Integer(limit as i64));
    }

    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(values), entry_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<LogEntry> {
    let category: String = row.get(8)?;
    let equipment: Option<String> = row.get(13)?;
    let date_days: i32 = row.get(10)?;
    let time_secs: u32 = row.get(11)?;
    let time_nanos: u32 = row.get(12)?;

    let date = NaiveDate::from_num_days_from_ce_opt(date_days)
        .ok_or_else(|| corrupt(10, Type::Integer, format!("day number {date_days} out of range")))?;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(time_secs, time_nanos)
        .ok_or_else(|| corrupt(11, Type::Integer, format!("clock time {time_secs}s+{time_nanos}ns out of range")))?;

    Ok(LogEntry {
        id: row.get(0)?,
        content: row.get(1)?,
        site: row.get(2)?,
        area: row.get(3)?,
        country: row.get(4)?,
        depth_max: row.get(5)?,
        depth_avg: row.get(6)?,
        duration_minutes: row.get(7)?,
        category: decode_list(Some(&category)),
        highlights: row.get(9)?,
        date,
        time,
        equipment: decode_list(equipment.as_deref()),
    })
}

fn preference_from_row(row: &Row<'_>) -> rusqlite::Result<Preference> {
    let raw: String = row.get(2)?;
    let updated_at = DateTime::parse_from_rfc3339(&raw)
        .map_err(|e| corrupt(2, Type::Text, format!("bad timestamp {raw:?}: {e}")))?
        .with_timezone(&Utc);
    Ok(Preference {
        key: row.get(0)?,
        value: row.get(1)?,
        updated_at,
    })
}

fn corrupt(column: usize, ty: Type, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        ty,
        Box::new(std::io::Error::other(msg)),
    )
}
