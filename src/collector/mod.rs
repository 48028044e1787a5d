//! Collector module for paginated post retrieval
//!
//! This module contains the core collection logic, including:
//! - HTTP fetching against the search API
//! - Retry policy for rate limits and transient failures
//! - Walking the cursor chain of one window
//! - Overall run coordination across windows

mod fetcher;
mod orchestrator;
mod retry;
mod walker;

pub use fetcher::{build_http_client, FetchOutcome, SearchClient};
pub use orchestrator::{
    normalize_account, CollectionReport, CollectionRequest, Collector, PlannedWindow,
};
pub use retry::{Decision, OutcomeClass, RetryBudget, RetryPolicy};
pub use walker::{WindowReport, WindowWalker};

use crate::config::Config;
use crate::CollectError;

/// Runs a complete collection for one account
///
/// Opens the account's store under the configured data directory, resumes
/// from what it holds and walks every uncovered window of the range.
///
/// # Arguments
///
/// * `config` - The collector configuration
/// * `request` - Account, date range and API key
/// * `config_hash` - Hash recorded with the run
///
/// # Returns
///
/// * `Ok(CollectionReport)` - Run finished; some months may still be uncovered
/// * `Err(CollectError)` - The run could not start or the store failed
pub async fn collect(
    config: Config,
    request: CollectionRequest,
    config_hash: &str,
) -> Result<CollectionReport, CollectError> {
    let mut collector = Collector::new(config, request, config_hash)?;
    collector.run().await
}
