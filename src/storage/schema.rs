//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the per-account store.
//! The `posts` table is both the collected dataset and the resume checkpoint,
//! so it is append-only: triggers reject updates and deletes.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track collection runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- Collected posts, in collection order
CREATE TABLE IF NOT EXISTS posts (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL,
    text TEXT NOT NULL,
    retweet_count INTEGER NOT NULL DEFAULT 0,
    reply_count INTEGER NOT NULL DEFAULT 0,
    like_count INTEGER NOT NULL DEFAULT 0,
    quote_count INTEGER NOT NULL DEFAULT 0,
    view_count INTEGER NOT NULL DEFAULT 0,
    bookmark_count INTEGER NOT NULL DEFAULT 0,
    collected_run INTEGER REFERENCES runs(id)
);

CREATE TRIGGER IF NOT EXISTS posts_no_update
BEFORE UPDATE ON posts
BEGIN
    SELECT RAISE(ABORT, 'posts are append-only');
END;

CREATE TRIGGER IF NOT EXISTS posts_no_delete
BEFORE DELETE ON posts
BEGIN
    SELECT RAISE(ABORT, 'posts are append-only');
END;

-- One row per walked window. A month is covered when the latest run that
-- walked it drained all `month_windows` windows it planned for that month
CREATE TABLE IF NOT EXISTS windows (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    month TEXT NOT NULL,
    since TEXT NOT NULL,
    until TEXT NOT NULL,
    outcome TEXT NOT NULL,
    pages_fetched INTEGER NOT NULL,
    new_records INTEGER NOT NULL,
    month_windows INTEGER NOT NULL DEFAULT 1,
    finished_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_windows_month ON windows(month);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
