//! Storage traits and error types
//!
//! This module defines the trait interface for record stores and
//! associated error types.

use crate::record::Record;
use crate::state::{ResumeState, WindowOutcome};
use crate::storage::{RunRecord, RunStatus, WindowRecord};
use crate::window::TimeWindow;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for append-only record stores
///
/// Records handed to `append` are buffered and only become durable at the
/// next `flush_window`, which writes them together with the window's ledger
/// row. A process killed mid-window therefore leaves no trace of that window.
pub trait RecordStore {
    // ===== Run Management =====

    /// Creates a new collection run and returns its ID
    fn create_run(&mut self, account: &str, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Sets the final status of a run and stamps its finish time
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Marks runs left `running` by a killed process as interrupted
    ///
    /// Returns the number of runs updated.
    fn mark_stale_runs_interrupted(&mut self) -> StorageResult<usize>;

    // ===== Records =====

    /// Buffers a record for the current window
    fn append(&mut self, record: Record);

    /// Number of records buffered since the last flush
    fn pending_len(&self) -> usize;

    /// Drops buffered records without writing them
    ///
    /// Returns the number of records dropped.
    fn discard_pending(&mut self) -> usize;

    /// Durably writes buffered records and the window's ledger row
    ///
    /// `month_windows` is the number of windows the run planned under the
    /// same month key. Returns the number of records actually inserted.
    fn flush_window(
        &mut self,
        run_id: i64,
        window: &TimeWindow,
        outcome: WindowOutcome,
        pages_fetched: u32,
        month_windows: u32,
    ) -> StorageResult<usize>;

    /// Loads every persisted record in collection order
    fn load_records(&self) -> StorageResult<Vec<Record>>;

    /// Counts persisted records
    fn count_records(&self) -> StorageResult<u64>;

    /// Counts persisted records per creation month (`unparsed` for bad timestamps)
    fn count_records_by_month(&self) -> StorageResult<BTreeMap<String, u64>>;

    // ===== Resume =====

    /// Ledger rows of the most recent run that walked each month
    fn latest_window_outcomes(&self) -> StorageResult<Vec<WindowRecord>>;

    /// Rebuilds the identity and coverage sets from what has been persisted
    fn load_resume_state(&self) -> StorageResult<ResumeState>;
}
