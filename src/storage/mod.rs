//! Storage module for persisting collected posts
//!
//! This module handles all database operations for the collector, including:
//! - SQLite database initialization and schema management
//! - Append-only post persistence with window-boundary flushes
//! - The window ledger used to tell complete months from partial ones
//! - Run tracking

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{RecordStore, StorageError, StorageResult};

use crate::state::WindowOutcome;
use crate::CollectError;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name of the per-account store
pub const STORE_FILE_NAME: &str = "posts.db";

/// Path of the store for an account: `<data_dir>/<account>/posts.db`
pub fn store_path(data_dir: &Path, account: &str) -> PathBuf {
    data_dir.join(account).join(STORE_FILE_NAME)
}

/// Opens (creating if needed) the store of an account
///
/// # Arguments
///
/// * `data_dir` - Directory holding one sub-directory per account
/// * `account` - Account whose posts the store holds
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully opened store
/// * `Err(CollectError)` - Failed to create the directory or open the database
pub fn open_store(data_dir: &Path, account: &str) -> Result<SqliteStore, CollectError> {
    let path = store_path(data_dir, account);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    SqliteStore::new(&path)
}

/// Opens the store of an account that has already been collected
///
/// Unlike `open_store`, this never creates anything, so a mistyped account
/// is reported instead of leaving an empty store behind.
pub fn open_existing_store(data_dir: &Path, account: &str) -> Result<SqliteStore, CollectError> {
    let path = store_path(data_dir, account);
    if !path.is_file() {
        return Err(CollectError::StoreNotFound(path));
    }
    SqliteStore::new(&path)
}

/// Decides, per month, whether the ledger rows prove the month complete
///
/// `rows` are the ledger rows of the latest run that walked each month. A
/// month is complete when that run walked every window it planned for the
/// month and all of them drained.
pub fn month_completion(rows: &[WindowRecord]) -> BTreeMap<String, bool> {
    let mut walked: BTreeMap<&str, (u32, u32, bool)> = BTreeMap::new();

    for row in rows {
        let entry = walked.entry(row.month.as_str()).or_insert((0, 0, true));
        entry.0 += 1;
        entry.1 = entry.1.max(row.month_windows);
        entry.2 &= row.outcome.is_complete();
    }

    walked
        .into_iter()
        .map(|(month, (count, planned, drained))| {
            (month.to_string(), drained && count >= planned)
        })
        .collect()
}

/// Represents a collection run in the database
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub account: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Represents one walked window in the ledger
#[derive(Debug, Clone)]
pub struct WindowRecord {
    pub run_id: i64,
    pub month: String,
    pub since: String,
    pub until: String,
    pub outcome: WindowOutcome,
    pub pages_fetched: u32,
    pub new_records: u64,
    /// Windows the run planned under this month key
    pub month_windows: u32,
    pub finished_at: String,
}

/// Status of a collection run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
