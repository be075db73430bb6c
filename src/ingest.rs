use std::path::Path;

use anyhow::Context;
use tracing::debug;

use crate::models::{Dataset, RawRecord};

/// Reads one dataset's CSV into raw records. Rows with empty fields come
/// through as `None` values for the cleaner to judge; only a structurally
/// broken file (unreadable, wrong column count) is an error.
pub fn read_records(dataset: Dataset, path: &Path) -> anyhow::Result<Vec<RawRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {dataset} input {}", path.display()))?;

    let mut records = Vec::new();
    for result in reader.deserialize::<RawRecord>() {
        let record =
            result.with_context(|| format!("malformed {dataset} CSV {}", path.display()))?;
        records.push(record);
    }

    debug!(dataset = %dataset, rows = records.len(), "read raw records");
    Ok(records)
}
