//! Output module for reporting on collected data
//!
//! This module handles:
//! - Exporting the record set as CSV
//! - Summarizing what a store holds and which months are covered

mod csv_export;
pub mod stats;

pub use csv_export::{export_csv, write_csv, EXPORT_FILE_NAME};
pub use stats::{load_statistics, print_statistics, CollectionStatistics};
