//! Collection orchestrator
//!
//! Drives a whole collection run for one account:
//! - Rebuilding the resume state from the store
//! - Planning monthly windows over the requested range
//! - Skipping covered months and walking the rest
//! - Flushing each window and updating coverage
//! - Recording the run in the store's run ledger

use crate::collector::fetcher::SearchClient;
use crate::collector::walker::WindowWalker;
use crate::config::Config;
use crate::state::ResumeState;
use crate::storage::{open_store, RecordStore, RunStatus, SqliteStore};
use crate::window::{generate_windows, TimeWindow};
use crate::CollectError;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tokio::time::sleep;

/// What to collect
#[derive(Debug, Clone)]
pub struct CollectionRequest {
    /// Account handle, without a leading `@`
    pub account: String,
    /// Inclusive lower bound of the range
    pub start: NaiveDate,
    /// Exclusive upper bound of the range
    pub end: NaiveDate,
    /// Credential for the search API; only needed when windows are walked
    pub api_key: Option<String>,
    /// Walk covered months too, picking up posts missed earlier
    pub recheck: bool,
}

/// A planned window and whether it would be skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedWindow {
    pub window: TimeWindow,
    pub covered: bool,
}

/// Summary of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionReport {
    /// Windows in the plan
    pub windows_total: usize,
    /// Windows skipped because their month was already covered
    pub skipped: usize,
    /// Windows walked to completion
    pub covered: usize,
    /// Windows that ended early and stay uncovered
    pub partial: usize,
    /// Records inserted by this run
    pub new_records: usize,
    /// Fetched records whose identity was already known
    pub duplicates: usize,
    /// Records in the store after the run
    pub total_records: u64,
    /// Months with at least one partial window, each listed once
    pub uncovered_months: Vec<String>,
}

/// Validates an account handle and strips a leading `@`
///
/// The handle doubles as a directory name, so only ASCII letters, digits
/// and underscores are accepted.
pub fn normalize_account(account: &str) -> Result<String, CollectError> {
    let trimmed = account.trim();
    let handle = trimmed.strip_prefix('@').unwrap_or(trimmed);

    if handle.is_empty()
        || !handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(CollectError::InvalidAccount(account.to_string()));
    }

    Ok(handle.to_string())
}

/// Main collection coordinator structure
pub struct Collector<S: RecordStore = SqliteStore> {
    config: Config,
    request: CollectionRequest,
    config_hash: String,
    store: S,
    resume: ResumeState,
    run_id: Option<i64>,
}

impl Collector<SqliteStore> {
    /// Creates a collector backed by the account's store under the data directory
    ///
    /// # Arguments
    ///
    /// * `config` - The collector configuration
    /// * `request` - Account and date range to collect
    /// * `config_hash` - Hash of the configuration, recorded with the run
    ///
    /// # Returns
    ///
    /// * `Ok(Collector)` - Store opened and resume state loaded
    /// * `Err(CollectError)` - Invalid account or the store could not be opened
    pub fn new(
        config: Config,
        request: CollectionRequest,
        config_hash: &str,
    ) -> Result<Self, CollectError> {
        let account = normalize_account(&request.account)?;
        let store = open_store(Path::new(&config.output.data_dir), &account)?;
        Self::with_store(
            config,
            CollectionRequest { account, ..request },
            store,
            config_hash,
        )
    }
}

impl<S: RecordStore> Collector<S> {
    /// Creates a collector over an already opened store
    pub fn with_store(
        config: Config,
        request: CollectionRequest,
        store: S,
        config_hash: &str,
    ) -> Result<Self, CollectError> {
        let account = normalize_account(&request.account)?;
        let resume = store.load_resume_state()?;

        tracing::info!(
            "Loaded store for @{}: {} posts, {} covered months",
            account,
            resume.seen.len(),
            resume.coverage.len()
        );

        Ok(Self {
            config,
            request: CollectionRequest { account, ..request },
            config_hash: config_hash.to_string(),
            store,
            resume,
            run_id: None,
        })
    }

    /// The windows a run would visit, newest first
    pub fn plan(&self) -> Vec<PlannedWindow> {
        generate_windows(self.request.start, self.request.end)
            .into_iter()
            .map(|window| PlannedWindow {
                covered: self.resume.coverage.contains(&window.month_key()),
                window,
            })
            .collect()
    }

    /// Runs the collection
    ///
    /// Window-level failures (rate limits, server errors, page cap) leave the
    /// month uncovered and the run continues. Storage failures end the run.
    pub async fn run(&mut self) -> Result<CollectionReport, CollectError> {
        let api_key = self
            .request
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(CollectError::MissingApiKey)?;
        let client = SearchClient::new(&self.config.api, &self.config.pacing, api_key)?;

        let stale = self.store.mark_stale_runs_interrupted()?;
        if stale > 0 {
            tracing::warn!("Marked {} unfinished run(s) as interrupted", stale);
        }

        let run_id = self
            .store
            .create_run(&self.request.account, &self.config_hash)?;
        self.run_id = Some(run_id);

        let windows = generate_windows(self.request.start, self.request.end);
        tracing::info!(
            "Starting run {} for @{}: {} window(s) from {} to {}",
            run_id,
            self.request.account,
            windows.len(),
            self.request.start,
            self.request.end
        );

        let mut report = CollectionReport {
            windows_total: windows.len(),
            ..CollectionReport::default()
        };

        match self.walk_windows(&client, run_id, &windows, &mut report).await {
            Ok(()) => {
                self.store.finish_run(run_id, RunStatus::Completed)?;
                self.run_id = None;
            }
            Err(e) => {
                tracing::error!("Run {} failed: {}", run_id, e);
                self.store.discard_pending();
                if let Err(finish_err) = self.store.finish_run(run_id, RunStatus::Failed) {
                    tracing::warn!("Could not mark run {} as failed: {}", run_id, finish_err);
                }
                self.run_id = None;
                return Err(e);
            }
        }

        report.total_records = self.store.count_records()?;

        tracing::info!(
            "Run {} completed: {} new posts ({} duplicates), {} total, {} covered, {} skipped, {} partial",
            run_id,
            report.new_records,
            report.duplicates,
            report.total_records,
            report.covered,
            report.skipped,
            report.partial
        );

        Ok(report)
    }

    async fn walk_windows(
        &mut self,
        client: &SearchClient,
        run_id: i64,
        windows: &[TimeWindow],
        report: &mut CollectionReport,
    ) -> Result<(), CollectError> {
        let account = self.request.account.clone();
        let walker = WindowWalker::new(client, &account, &self.config.pacing);
        let inter_window_delay = self.config.pacing.inter_window_delay();

        // Skips follow the coverage loaded at start. Windows of one month
        // can be split (the clamped oldest window shares its month with the
        // next one), so a month only becomes covered once every window
        // planned under it has drained.
        let covered_at_start = self.resume.coverage.clone();
        let recheck = self.request.recheck;
        let mut month_windows: BTreeMap<String, u32> = BTreeMap::new();
        for window in windows {
            let month = window.month_key();
            if recheck || !covered_at_start.contains(&month) {
                *month_windows.entry(month).or_insert(0) += 1;
            }
        }
        let mut remaining = month_windows.clone();
        let mut unresolved: BTreeSet<String> = BTreeSet::new();

        for (index, window) in windows.iter().enumerate() {
            let position = index + 1;
            let month = window.month_key();

            if !recheck && covered_at_start.contains(&month) {
                tracing::info!(
                    "[Window {}/{}] {} already covered, skipping",
                    position,
                    windows.len(),
                    window
                );
                report.skipped += 1;
                continue;
            }

            tracing::info!("[Window {}/{}] {}", position, windows.len(), window);

            let walked = walker
                .walk(window, &mut self.resume.seen, &mut self.store)
                .await;
            let planned = month_windows.get(&month).copied().unwrap_or(1);
            let inserted = self.store.flush_window(
                run_id,
                window,
                walked.outcome,
                walked.pages_fetched,
                planned,
            )?;
            report.new_records += inserted;
            report.duplicates += walked.duplicates;

            if walked.outcome.is_complete() {
                report.covered += 1;
            } else {
                tracing::warn!(
                    "{} ended early ({}); {} stays uncovered",
                    window,
                    walked.outcome,
                    month
                );
                report.partial += 1;
                if unresolved.insert(month.clone()) {
                    report.uncovered_months.push(month.clone());
                }
            }

            let left = remaining.entry(month.clone()).or_insert(1);
            *left = left.saturating_sub(1);
            if *left == 0 && !unresolved.contains(&month) {
                self.resume.coverage.mark(month);
            }

            tracing::info!(
                "  -> {} new posts, {} duplicates in {} page(s), {} known overall",
                inserted,
                walked.duplicates,
                walked.pages_fetched,
                self.resume.seen.len()
            );

            if position < windows.len() {
                sleep(inter_window_delay).await;
            }
        }

        Ok(())
    }

    /// Records an interrupted run, dropping records of the window in flight
    ///
    /// Safe to call when no run is active.
    pub fn mark_interrupted(&mut self) -> Result<(), CollectError> {
        let dropped = self.store.discard_pending();
        if dropped > 0 {
            tracing::warn!("Discarded {} unflushed post(s) of the current window", dropped);
        }

        if let Some(run_id) = self.run_id.take() {
            self.store.finish_run(run_id, RunStatus::Interrupted)?;
            tracing::warn!("Run {} marked as interrupted", run_id);
        }

        Ok(())
    }

    /// Current resume state (identities and coverage)
    pub fn resume_state(&self) -> &ResumeState {
        &self.resume
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn request(&self) -> &CollectionRequest {
        &self.request
    }
}
