//! Statistics generation from the record store
//!
//! This module provides functionality for extracting and displaying
//! collection statistics from the storage layer.

use crate::storage::{RecordStore, RunRecord, WindowRecord};
use crate::CollectError;
use std::collections::BTreeMap;

/// Collection statistics summary
#[derive(Debug, Clone)]
pub struct CollectionStatistics {
    /// Total number of persisted posts
    pub total_records: u64,

    /// Posts per creation month
    pub records_by_month: BTreeMap<String, u64>,

    /// Months a run would skip, ascending
    pub covered_months: Vec<String>,

    /// Ledger rows of the latest run that walked each month, by month
    pub latest_windows: Vec<WindowRecord>,

    /// Most recent run, if any
    pub latest_run: Option<RunRecord>,
}

impl CollectionStatistics {
    /// Walked months whose latest run left at least one window unfinished
    pub fn unresolved_months(&self) -> Vec<&str> {
        let mut months: Vec<&str> = self
            .latest_windows
            .iter()
            .filter(|w| !self.covered_months.contains(&w.month))
            .map(|w| w.month.as_str())
            .collect();
        months.dedup();
        months
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The record store to query
///
/// # Returns
///
/// * `Ok(CollectionStatistics)` - Successfully loaded statistics
/// * `Err(CollectError)` - Failed to query statistics
pub fn load_statistics(store: &dyn RecordStore) -> Result<CollectionStatistics, CollectError> {
    let total_records = store.count_records()?;
    let records_by_month = store.count_records_by_month()?;
    let resume = store.load_resume_state()?;
    let latest_windows = store.latest_window_outcomes()?;
    let latest_run = store.get_latest_run()?;

    Ok(CollectionStatistics {
        total_records,
        records_by_month,
        covered_months: resume.coverage.iter().map(str::to_string).collect(),
        latest_windows,
        latest_run,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CollectionStatistics) {
    println!("=== Collection Statistics ===\n");

    println!("Overview:");
    println!("  Total posts: {}", stats.total_records);
    println!("  Covered months: {}", stats.covered_months.len());
    println!();

    if let Some(run) = &stats.latest_run {
        println!("Latest Run:");
        println!("  ID: {}", run.id);
        println!("  Status: {}", run.status.to_db_string());
        println!("  Started: {}", run.started_at);
        if let Some(finished) = &run.finished_at {
            println!("  Finished: {}", finished);
        }
        println!("  Config hash: {}", run.config_hash);
        println!();
    }

    if !stats.records_by_month.is_empty() {
        println!("Posts by Month:");
        for (month, count) in stats.records_by_month.iter().rev() {
            let marker = if stats.covered_months.iter().any(|m| m == month) {
                "covered"
            } else {
                "partial"
            };
            println!("  {}: {} ({})", month, count, marker);
        }
        println!();
    }

    let unresolved = stats.unresolved_months();
    if !unresolved.is_empty() {
        println!("Unresolved Months ({}):", unresolved.len());
        for window in stats
            .latest_windows
            .iter()
            .filter(|w| !stats.covered_months.contains(&w.month))
        {
            println!(
                "  - {} {}..{} ({}, {} pages, run {})",
                window.month,
                window.since,
                window.until,
                window.outcome,
                window.pages_fetched,
                window.run_id
            );
        }
        println!();
    }
}
