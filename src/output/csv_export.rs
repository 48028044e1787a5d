//! CSV export of the record set
//!
//! Columns follow `record::FIELDS`, rows follow collection order.

use crate::record::FIELDS;
use crate::storage::RecordStore;
use crate::CollectError;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Default file name of the export, next to the account's store
pub const EXPORT_FILE_NAME: &str = "tweets.csv";

/// Writes every persisted record to `writer` as CSV
///
/// The header row is always written, even for an empty store.
///
/// # Returns
///
/// * `Ok(usize)` - Number of data rows written
/// * `Err(CollectError)` - Reading the store or writing the output failed
pub fn write_csv<W: Write>(store: &dyn RecordStore, writer: W) -> Result<usize, CollectError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(FIELDS)?;

    let records = store.load_records()?;
    for record in &records {
        csv_writer.serialize(record)?;
    }

    csv_writer.flush()?;
    Ok(records.len())
}

/// Exports every persisted record to a CSV file at `path`
pub fn export_csv(store: &dyn RecordStore, path: &Path) -> Result<usize, CollectError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let rows = write_csv(store, file)?;

    tracing::info!("Exported {} posts to {}", rows, path.display());
    Ok(rows)
}
