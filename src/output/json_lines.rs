//! JSON-lines result sink
//!
//! Each store is a directory under the output root, with one file per key.
//! Every append writes a single compact JSON array followed by a newline.

use crate::output::traits::{OutputError, OutputResult, ResultSink, Store};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Append-only sink writing `<root>/<store>/<key>.json`
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    root: PathBuf,
}

impl JsonLinesSink {
    /// Creates a sink rooted at `root`
    ///
    /// Store directories are created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the file backing `key` in `store`
    pub fn path_for(&self, store: Store, key: &str) -> OutputResult<PathBuf> {
        validate_key(key)?;
        Ok(self
            .root
            .join(store.dir_name())
            .join(format!("{}.json", key)))
    }
}

impl ResultSink for JsonLinesSink {
    fn append<T: Serialize>(
        &mut self,
        store: Store,
        key: &str,
        records: &[T],
    ) -> OutputResult<()> {
        let path = self.path_for(store, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut line = serde_json::to_vec(records)?;
        line.push(b'\n');

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(&line)?;
        file.flush()?;

        tracing::debug!(
            store = %store,
            key,
            records = records.len(),
            "Appended batch to {}",
            path.display()
        );

        Ok(())
    }
}

/// Keys become file names, so they must not escape the store directory
fn validate_key(key: &str) -> OutputResult<()> {
    if key.is_empty()
        || key == "."
        || key.contains("..")
        || key.contains('/')
        || key.contains('\\')
        || key.contains('\0')
    {
        return Err(OutputError::InvalidKey(key.to_string()));
    }
    Ok(())
}
