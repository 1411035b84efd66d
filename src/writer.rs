//! Append-only CSV sink. The header goes in exactly once, when the file is new or empty.

use crate::dedupe::KeyIndex;
use crate::models::{Row, COLUMNS};
use crate::util::{ensure_parent_dir, is_missing_or_empty, open_append_with_backoff};
use anyhow::{Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};

pub struct CsvAppender {
    path: PathBuf,
    w: csv::Writer<File>,
    keys: Option<KeyIndex>,
    rows_skipped: u64,
}

impl CsvAppender {
    /// Open `path` for appending. With `dedupe`, rows whose post/comment key was
    /// already written (this run or an earlier one) are skipped.
    pub fn open(path: &Path, dedupe: bool) -> Result<Self> {
        ensure_parent_dir(path).with_context(|| format!("create parent of {}", path.display()))?;
        let needs_header = is_missing_or_empty(path);

        let file = open_append_with_backoff(path, 16, 50)
            .with_context(|| format!("open {}", path.display()))?;
        // Header is written by hand so a batch with zero rows still leaves a well-formed file.
        let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if needs_header {
            w.write_record(COLUMNS).with_context(|| format!("write header to {}", path.display()))?;
            w.flush()?;
            tracing::info!(path = %path.display(), "created output with header");
        }

        let keys = if dedupe { Some(KeyIndex::open(path)?) } else { None };

        Ok(Self { path: path.to_path_buf(), w, keys, rows_skipped: 0 })
    }

    /// Append rows and flush. Returns how many were actually written.
    pub fn append(&mut self, rows: &[Row]) -> Result<usize> {
        let mut n = 0usize;
        for row in rows {
            let key = row.key();
            if self.keys.as_ref().is_some_and(|k| k.contains(&key)) {
                self.rows_skipped += 1;
                continue;
            }
            self.w
                .serialize(row)
                .with_context(|| format!("write row to {}", self.path.display()))?;
            // Key goes in only once the row is in the CSV buffer.
            if let Some(keys) = self.keys.as_mut() {
                keys.insert(key)?;
            }
            n += 1;
        }
        self.w.flush().with_context(|| format!("flush {}", self.path.display()))?;
        if let Some(keys) = self.keys.as_mut() {
            keys.flush()?;
        }
        Ok(n)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_skipped(&self) -> u64 {
        self.rows_skipped
    }
}
