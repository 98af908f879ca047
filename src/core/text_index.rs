//! Derived inverted index over the text-bearing entry fields.
//!
//! The index lives in two tables, `index_docs` (one row per entry, with its
//! token count) and `index_postings` (one row per distinct term per entry). It
//! has no identity of its own: rows are keyed by the owning entry's `seq` and
//! are only written from [`crate::persist::sqlite::LogStore::create`], inside
//! the same transaction that writes the entry.

use std::cmp::Ordering;

use hashbrown::{HashMap, HashSet};
use rusqlite::{Connection, params};

use crate::{
    core::{
        scorer::{Bm25Params, CorpusStats},
        tokenizer::{is_match_all, query_terms, tokenize},
    },
    entry::LogEntry,
    types::EntryId,
};

/// One ranked search result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredEntry {
    /// Matching entry.
    pub id: EntryId,
    /// Relevance; higher is better, `0.0` for match-all results.
    pub score: f64,
}

/// Sort key giving newest-first order with insertion order breaking ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Recency {
    pub date_days: i32,
    pub time_secs: u32,
    pub time_nanos: u32,
    pub seq: i64,
}

impl Ord for Recency {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.date_days, other.time_secs, other.time_nanos)
            .cmp(&(self.date_days, self.time_secs, self.time_nanos))
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Recency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Writes the index rows for a freshly inserted entry.
///
/// Every entry gets an `index_docs` row, even one with no indexable text, so
/// the one-to-one link between entries and index documents always holds.
pub(crate) fn index_entry(conn: &Connection, seq: i64, entry: &LogEntry) -> rusqlite::Result<()> {
    let mut term_freqs: HashMap<String, u32> = HashMap::new();
    let mut doc_len: u32 = 0;
    for text in entry.indexed_text().into_iter().flatten() {
        for token in tokenize(text) {
            *term_freqs.entry(token).or_default() += 1;
            doc_len += 1;
        }
    }

    conn.execute(
        "INSERT INTO index_docs(entry_seq, doc_len) VALUES (?1, ?2)",
        params![seq, doc_len],
    )?;

    let mut stmt = conn
        .prepare_cached("INSERT INTO index_postings(term, entry_seq, tf) VALUES (?1, ?2, ?3)")?;
    for (term, tf) in &term_freqs {
        stmt.execute(params![term, seq, tf])?;
    }
    Ok(())
}

/// Number of indexed entries and their mean token count.
pub(crate) fn corpus_stats(conn: &Connection) -> rusqlite::Result<CorpusStats> {
    conn.query_row(
        "SELECT COUNT(*), COALESCE(AVG(doc_len), 0.0) FROM index_docs",
        [],
        |row| {
            let total: i64 = row.get(0)?;
            Ok(CorpusStats {
                total_docs: total as u64,
                avg_doc_len: row.get(1)?,
            })
        },
    )
}

/// Ranks entries against `query` with OR semantics across its terms.
///
/// An empty, wildcard, or term-less query matches every indexed entry with a
/// neutral score, newest first. When `candidates` is given, only those ids
/// can appear in the output.
pub(crate) fn ranked_search(
    conn: &Connection,
    query: &str,
    candidates: Option<&HashSet<EntryId>>,
    limit: usize,
    bm25: &Bm25Params,
) -> rusqlite::Result<Vec<ScoredEntry>> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    if is_match_all(query) {
        return match_all(conn, candidates, limit);
    }

    let stats = corpus_stats(conn)?;
    let mut scores: HashMap<i64, (EntryId, Recency, f64)> = HashMap::new();
    let mut postings = conn.prepare_cached(
        "SELECT p.entry_seq, p.tf, d.doc_len, e.id, e.date_days, e.time_secs, e.time_nanos \
         FROM index_postings p \
         JOIN index_docs d ON d.entry_seq = p.entry_seq \
         JOIN entries e ON e.seq = p.entry_seq \
         WHERE p.term = ?1",
    )?;
    for term in query_terms(query) {
        let hits = postings
            .query_map(params![term], |row| {
                let seq: i64 = row.get(0)?;
                Ok((
                    row.get::<_, u32>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, EntryId>(3)?,
                    Recency {
                        date_days: row.get(4)?,
                        time_secs: row.get(5)?,
                        time_nanos: row.get(6)?,
                        seq,
                    },
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        if hits.is_empty() {
            continue;
        }
        // Document frequency counts the whole corpus, not just the candidates.
        let idf = bm25.idf(&stats, hits.len() as u64);
        for (tf, doc_len, id, recency) in hits {
            if candidates.is_some_and(|c| !c.contains(&id)) {
                continue;
            }
            let term_score = bm25.term_score(idf, tf, doc_len, &stats);
            scores.entry(recency.seq).or_insert((id, recency, 0.0)).2 += term_score;
        }
    }

    let mut ranked: Vec<(ScoredEntry, Recency)> = scores
        .into_values()
        .map(|(id, recency, score)| (ScoredEntry { id, score }, recency))
        .collect();
    ranked.sort_by(|(a, ra), (b, rb)| b.score.total_cmp(&a.score).then_with(|| ra.cmp(rb)));
    ranked.truncate(limit);
    Ok(ranked.into_iter().map(|(hit, _)| hit).collect())
}

fn match_all(
    conn: &Connection,
    candidates: Option<&HashSet<EntryId>>,
    limit: usize,
) -> rusqlite::Result<Vec<ScoredEntry>> {
    let mut stmt = conn.prepare_cached(
        "SELECT e.id FROM entries e JOIN index_docs d ON d.entry_seq = e.seq \
         ORDER BY e.date_days DESC, e.time_secs DESC, e.time_nanos DESC, e.seq ASC",
    )?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let id: EntryId = row.get(0)?;
        if candidates.is_some_and(|c| !c.contains(&id)) {
            continue;
        }
        out.push(ScoredEntry { id, score: 0.0 });
        if out.len() == limit {
            break;
        }
    }
    Ok(out)
}

/// Number of entries that have an index document.
pub(crate) fn indexed_count(conn: &Connection) -> rusqlite::Result<u64> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM index_docs", [], |row| row.get(0))?;
    Ok(n as u64)
}
