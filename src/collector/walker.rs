//! Window walker
//!
//! Drains the cursor chain of a single window. Records are deduplicated
//! against the seen set and handed to the store's pending buffer; the caller
//! flushes them at the window boundary.

use crate::collector::fetcher::{FetchOutcome, SearchClient};
use crate::collector::retry::{Decision, RetryPolicy};
use crate::config::PacingConfig;
use crate::record::RawPost;
use crate::state::{SeenIdentitySet, WindowOutcome};
use crate::storage::RecordStore;
use crate::window::TimeWindow;
use std::time::Duration;
use tokio::time::sleep;

/// Summary of one walked window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowReport {
    pub window: TimeWindow,
    pub outcome: WindowOutcome,
    /// Pages successfully fetched and decoded
    pub pages_fetched: u32,
    /// Records handed to the store
    pub new_records: usize,
    /// Records dropped because their identity was already seen
    pub duplicates: usize,
    /// Payloads dropped because they carried no identity
    pub missing_identity: usize,
}

impl WindowReport {
    fn new(window: TimeWindow) -> Self {
        Self {
            window,
            outcome: WindowOutcome::PageCapReached,
            pages_fetched: 0,
            new_records: 0,
            duplicates: 0,
            missing_identity: 0,
        }
    }

    fn finish(mut self, outcome: WindowOutcome) -> Self {
        self.outcome = outcome;
        self
    }
}

/// Walks the pages of one window for one account
pub struct WindowWalker<'a> {
    client: &'a SearchClient,
    account: &'a str,
    retry: RetryPolicy,
    inter_request_delay: Duration,
    max_pages: u32,
}

impl<'a> WindowWalker<'a> {
    pub fn new(client: &'a SearchClient, account: &'a str, pacing: &PacingConfig) -> Self {
        Self {
            client,
            account,
            retry: RetryPolicy::from_config(pacing),
            inter_request_delay: pacing.inter_request_delay(),
            max_pages: pacing.max_pages_per_window.max(1),
        }
    }

    /// Walks `window` until the API stops returning pages or a limit is hit
    ///
    /// New records go to `store`'s pending buffer and their identities into
    /// `seen`. Nothing is flushed here. Network failures never surface as
    /// errors; they are reported through the window outcome.
    pub async fn walk<S>(
        &self,
        window: &TimeWindow,
        seen: &mut SeenIdentitySet,
        store: &mut S,
    ) -> WindowReport
    where
        S: RecordStore + ?Sized,
    {
        let query = window.query_for(self.account);
        let mut report = WindowReport::new(*window);
        let mut budget = self.retry.budget();
        let mut cursor = String::new();
        let mut page = 1u32;

        while page <= self.max_pages {
            tracing::debug!("Fetching page {} of {} (cursor: {:?})", page, window, cursor);

            let outcome = self.client.fetch_page(&query, &cursor).await;
            let decision = budget.record(outcome.class());

            let search_page = match (decision, outcome) {
                (Decision::Proceed, FetchOutcome::Page(search_page)) => search_page,
                (Decision::RetryAfter(backoff), outcome) => {
                    tracing::warn!(
                        "{} on page {} of {}, retry {}/{} in {:?}",
                        describe(&outcome),
                        page,
                        window,
                        budget.failures(),
                        budget.max_attempts(),
                        backoff
                    );
                    sleep(backoff).await;
                    continue;
                }
                (Decision::GiveUp, outcome) => {
                    tracing::error!(
                        "Giving up on {} after {} attempts: {}",
                        window,
                        budget.failures(),
                        describe(&outcome)
                    );
                    return report.finish(WindowOutcome::RetriesExhausted);
                }
                (_, outcome) => {
                    tracing::error!("Aborting {}: {}", window, describe(&outcome));
                    return report.finish(WindowOutcome::Failed);
                }
            };

            report.pages_fetched += 1;

            if search_page.tweets.is_empty() {
                tracing::debug!("Empty page, {} drained", window);
                return report.finish(WindowOutcome::Drained);
            }

            let next_cursor = search_page.next_page_cursor().map(str::to_string);
            self.absorb(search_page.tweets, seen, store, &mut report);

            match next_cursor {
                Some(_) if page >= self.max_pages => break,
                Some(next) => {
                    cursor = next;
                    page += 1;
                    sleep(self.inter_request_delay).await;
                }
                None => return report.finish(WindowOutcome::Drained),
            }
        }

        tracing::warn!(
            "Page cap of {} reached for {}, leaving it unresolved",
            self.max_pages,
            window
        );
        report.finish(WindowOutcome::PageCapReached)
    }

    fn absorb<S>(
        &self,
        posts: Vec<RawPost>,
        seen: &mut SeenIdentitySet,
        store: &mut S,
        report: &mut WindowReport,
    ) where
        S: RecordStore + ?Sized,
    {
        for post in posts {
            let Some(record) = post.into_record() else {
                report.missing_identity += 1;
                continue;
            };

            if !seen.insert(&record.id) {
                report.duplicates += 1;
                continue;
            }

            store.append(record);
            report.new_records += 1;
        }
    }
}

fn describe(outcome: &FetchOutcome) -> String {
    match outcome {
        FetchOutcome::Page(_) => "page".to_string(),
        FetchOutcome::Timeout => "Request timed out".to_string(),
        FetchOutcome::Network { error } => format!("Network error: {}", error),
        FetchOutcome::RateLimited => "Rate limited (429)".to_string(),
        FetchOutcome::HttpError { status_code, body } => {
            format!("HTTP {}: {}", status_code, body)
        }
        FetchOutcome::Malformed { error } => format!("Malformed response: {}", error),
        FetchOutcome::InvalidRequest { error } => format!("Invalid request: {}", error),
    }
}
