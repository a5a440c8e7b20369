//! Target URL input
//!
//! Reads the list of URLs to crawl from a CSV file with a header row. Only the
//! configured column is read; blank cells are ignored and duplicates are
//! dropped, keeping the first occurrence.

use crate::{InputError, InputResult};
use std::collections::HashSet;
use std::path::Path;

/// Loads the de-duplicated target URL list from `path`
///
/// # Arguments
///
/// * `path` - Path to the CSV file
/// * `column` - Header name of the column holding the URLs
///
/// # Returns
///
/// * `Ok(Vec<String>)` - At least one URL, in order of first occurrence
/// * `Err(InputError)` - The file could not be read, the column is missing,
///   or it contains no URLs
pub fn load_target_urls(path: &Path, column: &str) -> InputResult<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let column_index = reader
        .headers()?
        .iter()
        .position(|header| header.trim() == column)
        .ok_or_else(|| InputError::MissingColumn {
            column: column.to_string(),
        })?;

    let mut cells = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(value) = record.get(column_index) {
            cells.push(value.to_string());
        }
    }

    let urls = dedupe_urls(cells);
    if urls.is_empty() {
        return Err(InputError::NoUrls {
            column: column.to_string(),
        });
    }

    tracing::debug!(
        "Loaded {} unique urls from {} (column '{}')",
        urls.len(),
        path.display(),
        column
    );

    Ok(urls)
}

/// Trims each value, drops blanks, and removes duplicates keeping the first occurrence
pub fn dedupe_urls<I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .filter(|value| seen.insert(value.clone()))
        .collect()
}
