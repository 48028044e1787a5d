//! State module for tracking collection progress
//!
//! This module provides the in-memory resume state owned by the collector
//! during a run.
//!
//! # Components
//!
//! - `SeenIdentitySet`: identities already persisted, used for deduplication
//! - `CoverageSet`: calendar months whose posts are fully collected
//! - `ResumeState`: both sets, derived from the persisted record sequence
//! - `WindowOutcome`: how the walk of a single window ended

mod coverage;
mod window_outcome;

// Re-export main types
pub use coverage::{CoverageSet, ResumeState, SeenIdentitySet};
pub use window_outcome::WindowOutcome;
