/// Window outcome definitions
///
/// A window is only trusted as covered when its walk drained every page the
/// API was willing to return.
use std::fmt;

/// Represents how the walk of one time window ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowOutcome {
    /// Pagination reached an empty page or the end of results
    Drained,

    /// The per-window page cap stopped the walk
    PageCapReached,

    /// A page kept failing transiently until the retry budget ran out
    RetriesExhausted,

    /// The API answered with a non-retryable status or a malformed body
    Failed,
}

impl WindowOutcome {
    /// Returns true if the window was fully collected
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Drained)
    }

    /// Converts the outcome to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Drained => "drained",
            Self::PageCapReached => "page_cap_reached",
            Self::RetriesExhausted => "retries_exhausted",
            Self::Failed => "failed",
        }
    }

    /// Parses an outcome from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "drained" => Some(Self::Drained),
            "page_cap_reached" => Some(Self::PageCapReached),
            "retries_exhausted" => Some(Self::RetriesExhausted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible outcomes
    pub fn all() -> [Self; 4] {
        [
            Self::Drained,
            Self::PageCapReached,
            Self::RetriesExhausted,
            Self::Failed,
        ]
    }
}

impl fmt::Display for WindowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
