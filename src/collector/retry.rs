//! Per-page retry policy
//!
//! Every page request runs through a small state machine: the outcome of an
//! attempt is classified, and the budget decides whether to proceed, retry
//! after a fixed backoff, or stop working on the current window.
//!
//! | Outcome | Decision |
//! |---------|----------|
//! | Success | Proceed, counter reset |
//! | Transient (timeout, network, HTTP 429) | Retry after backoff, until `max_attempts` consecutive failures |
//! | Fatal (other HTTP status, malformed body) | Abort the window |

use crate::config::PacingConfig;
use std::time::Duration;

/// Classification of a single request attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeClass {
    Success,
    Transient,
    Fatal,
}

/// What the caller should do after an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Use the response and move on
    Proceed,
    /// Wait, then repeat the same request
    RetryAfter(Duration),
    /// The retry budget is spent; abandon the rest of the window
    GiveUp,
    /// The failure is not retryable; abandon the rest of the window
    AbortWindow,
}

/// Bounded retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &PacingConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: config.retry_backoff(),
        }
    }

    /// Starts a fresh budget for a window
    pub fn budget(&self) -> RetryBudget {
        RetryBudget {
            policy: *self,
            failures: 0,
        }
    }
}

/// Consecutive-failure counter for the page currently being fetched
#[derive(Debug, Clone)]
pub struct RetryBudget {
    policy: RetryPolicy,
    failures: u32,
}

impl RetryBudget {
    /// Records the outcome of an attempt and decides what happens next
    pub fn record(&mut self, class: OutcomeClass) -> Decision {
        match class {
            OutcomeClass::Success => {
                self.failures = 0;
                Decision::Proceed
            }
            OutcomeClass::Fatal => Decision::AbortWindow,
            OutcomeClass::Transient => {
                self.failures += 1;
                if self.failures >= self.policy.max_attempts {
                    Decision::GiveUp
                } else {
                    Decision::RetryAfter(self.policy.backoff)
                }
            }
        }
    }

    /// Consecutive transient failures of the current page
    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn max_attempts(&self) -> u32 {
        self.policy.max_attempts
    }
}
