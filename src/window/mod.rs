//! Time window planning
//!
//! The search API degrades over very long ranges, so a collection range is cut
//! into sub-ranges of at most one calendar month. Windows are produced
//! newest-first, matching the order in which the API ranks results.

use chrono::{Months, NaiveDate};
use std::fmt;

/// A half-open date interval `[since, until)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    pub since: NaiveDate,
    pub until: NaiveDate,
}

impl TimeWindow {
    /// Creates a window, returning `None` unless `since < until`
    pub fn new(since: NaiveDate, until: NaiveDate) -> Option<Self> {
        (since < until).then_some(Self { since, until })
    }

    /// The calendar month this window is accounted under (`YYYY-MM` of `since`)
    pub fn month_key(&self) -> String {
        self.since.format("%Y-%m").to_string()
    }

    /// Builds the search query for an account restricted to this window
    pub fn query_for(&self, account: &str) -> String {
        format!(
            "from:{} since:{} until:{}",
            account,
            self.since.format("%Y-%m-%d"),
            self.until.format("%Y-%m-%d")
        )
    }

    /// Returns true if the given date falls inside the window
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.since <= date && date < self.until
    }

    /// Number of days spanned by the window
    pub fn num_days(&self) -> i64 {
        (self.until - self.since).num_days()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ {}", self.since, self.until)
    }
}

/// Splits `[start, end)` into monthly windows, newest first
///
/// Each step subtracts one calendar month from the current upper bound
/// (clamping the day of month, so `03-31` steps back to `02-28`/`02-29`).
/// The oldest window is clamped so its lower bound is exactly `start`.
/// Returns an empty plan when `start >= end`.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use post_harvest::window::generate_windows;
///
/// let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
/// let end = NaiveDate::from_ymd_opt(2024, 8, 15).unwrap();
/// let windows = generate_windows(start, end);
///
/// assert_eq!(windows.len(), 3);
/// assert_eq!(windows[0].until, end);
/// assert_eq!(windows[2].since, start);
/// ```
pub fn generate_windows(start: NaiveDate, end: NaiveDate) -> Vec<TimeWindow> {
    let mut windows = Vec::new();
    let mut current_end = end;

    while current_end > start {
        let current_start = current_end
            .checked_sub_months(Months::new(1))
            .map_or(start, |d| d.max(start));

        windows.push(TimeWindow {
            since: current_start,
            until: current_end,
        });
        current_end = current_start;
    }

    windows
}
