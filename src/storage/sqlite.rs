//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the RecordStore trait.

use crate::record::{month_key_of, Record};
use crate::state::{ResumeState, WindowOutcome};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RecordStore, StorageError, StorageResult};
use crate::storage::{month_completion, RunRecord, RunStatus, WindowRecord};
use crate::window::TimeWindow;
use crate::CollectError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;

/// SQLite record store
pub struct SqliteStore {
    conn: Connection,
    pending: Vec<Record>,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(CollectError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, CollectError> {
        let conn = Connection::open(path)?;

        // A committed window must survive power loss, not just a crash
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn,
            pending: Vec::new(),
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, CollectError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn,
            pending: Vec::new(),
        })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        account: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?)
            .unwrap_or(RunStatus::Failed),
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<Record> {
    let counter = |idx: usize| -> rusqlite::Result<u64> { Ok(row.get::<_, i64>(idx)?.max(0) as u64) };

    Ok(Record {
        id: row.get(0)?,
        created_at: row.get(1)?,
        text: row.get(2)?,
        retweet_count: counter(3)?,
        reply_count: counter(4)?,
        like_count: counter(5)?,
        quote_count: counter(6)?,
        view_count: counter(7)?,
        bookmark_count: counter(8)?,
    })
}

fn to_sql_counter(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl RecordStore for SqliteStore {
    // ===== Run Management =====

    fn create_run(&mut self, account: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (account, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![account, now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, account, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, account, started_at, finished_at, config_hash, status
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn mark_stale_runs_interrupted(&mut self) -> StorageResult<usize> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = COALESCE(finished_at, ?2) WHERE status = ?3",
            params![
                RunStatus::Interrupted.to_db_string(),
                now,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(updated)
    }

    // ===== Records =====

    fn append(&mut self, record: Record) {
        self.pending.push(record);
    }

    fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn discard_pending(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    fn flush_window(
        &mut self,
        run_id: i64,
        window: &TimeWindow,
        outcome: WindowOutcome,
        pages_fetched: u32,
        month_windows: u32,
    ) -> StorageResult<usize> {
        let records = std::mem::take(&mut self.pending);
        let tx = self.conn.transaction()?;
        let mut inserted = 0;

        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO posts
                 (id, created_at, text, retweet_count, reply_count, like_count,
                  quote_count, view_count, bookmark_count, collected_run)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;

            for record in &records {
                inserted += stmt.execute(params![
                    record.id,
                    record.created_at,
                    record.text,
                    to_sql_counter(record.retweet_count),
                    to_sql_counter(record.reply_count),
                    to_sql_counter(record.like_count),
                    to_sql_counter(record.quote_count),
                    to_sql_counter(record.view_count),
                    to_sql_counter(record.bookmark_count),
                    run_id,
                ])?;
            }
        }

        tx.execute(
            "INSERT INTO windows
             (run_id, month, since, until, outcome, pages_fetched, new_records,
              month_windows, finished_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                run_id,
                window.month_key(),
                window.since.to_string(),
                window.until.to_string(),
                outcome.to_db_string(),
                pages_fetched,
                inserted as i64,
                month_windows.max(1),
                Utc::now().to_rfc3339(),
            ],
        )?;

        tx.commit()?;
        Ok(inserted)
    }

    fn load_records(&self) -> StorageResult<Vec<Record>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, created_at, text, retweet_count, reply_count, like_count,
             quote_count, view_count, bookmark_count
             FROM posts ORDER BY seq ASC",
        )?;

        let records = stmt
            .query_map([], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn count_records(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_records_by_month(&self) -> StorageResult<BTreeMap<String, u64>> {
        let mut stmt = self.conn.prepare("SELECT created_at FROM posts")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut counts = BTreeMap::new();
        for row in rows {
            let month = month_key_of(&row?).unwrap_or_else(|| "unparsed".to_string());
            *counts.entry(month).or_insert(0) += 1;
        }

        Ok(counts)
    }

    // ===== Resume =====

    fn latest_window_outcomes(&self) -> StorageResult<Vec<WindowRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT w.run_id, w.month, w.since, w.until, w.outcome, w.pages_fetched,
             w.new_records, w.month_windows, w.finished_at
             FROM windows w
             WHERE w.run_id = (SELECT MAX(run_id) FROM windows WHERE month = w.month)
             ORDER BY w.month ASC, w.id ASC",
        )?;

        let windows = stmt
            .query_map([], |row| {
                Ok(WindowRecord {
                    run_id: row.get(0)?,
                    month: row.get(1)?,
                    since: row.get(2)?,
                    until: row.get(3)?,
                    outcome: WindowOutcome::from_db_string(&row.get::<_, String>(4)?)
                        .unwrap_or(WindowOutcome::Failed),
                    pages_fetched: row.get(5)?,
                    new_records: row.get::<_, i64>(6)?.max(0) as u64,
                    month_windows: row.get(7)?,
                    finished_at: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(windows)
    }

    fn load_resume_state(&self) -> StorageResult<ResumeState> {
        let completion = month_completion(&self.latest_window_outcomes()?);

        let mut stmt = self
            .conn
            .prepare("SELECT id, created_at FROM posts ORDER BY seq ASC")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ResumeState::derive(
            rows.iter().map(|(id, created_at)| (id.as_str(), created_at.as_str())),
            &completion,
        ))
    }
}
