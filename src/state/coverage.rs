use crate::record::month_key_of;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Identities of every record already persisted
///
/// Grows monotonically; there is no way to forget an identity.
#[derive(Debug, Clone, Default)]
pub struct SeenIdentitySet {
    ids: HashSet<String>,
}

impl SeenIdentitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an identity, returning false if it was already present
    pub fn insert(&mut self, id: &str) -> bool {
        if self.ids.contains(id) {
            return false;
        }
        self.ids.insert(id.to_string())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Calendar months (`YYYY-MM`) whose posts are fully collected
///
/// Grows monotonically within a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageSet {
    months: BTreeSet<String>,
}

impl CoverageSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, month: impl Into<String>) {
        self.months.insert(month.into());
    }

    pub fn contains(&self, month: &str) -> bool {
        self.months.contains(month)
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// Covered months in ascending order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.months.iter().map(String::as_str)
    }
}

/// Everything a run needs to resume where earlier runs stopped
#[derive(Debug, Clone, Default)]
pub struct ResumeState {
    pub seen: SeenIdentitySet,
    pub coverage: CoverageSet,
}

impl ResumeState {
    /// Derives the resume state from the persisted `(id, createdAt)` sequence
    ///
    /// `month_completion` maps every month recorded in the window ledger to
    /// whether all of its windows drained. Every identity is seen. When the
    /// ledger has entries, coverage comes from it alone. A store without any
    /// ledger entry falls back to the months of parseable record timestamps.
    pub fn derive<'a, I>(rows: I, month_completion: &BTreeMap<String, bool>) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut state = Self::default();
        let from_timestamps = month_completion.is_empty();

        for (id, created_at) in rows {
            if !id.is_empty() {
                state.seen.insert(id);
            }
            if from_timestamps {
                if let Some(month) = month_key_of(created_at) {
                    state.coverage.mark(month);
                }
            }
        }

        for (month, complete) in month_completion {
            if *complete {
                state.coverage.mark(month.clone());
            }
        }

        state
    }
}
