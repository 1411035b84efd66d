//! Opt-in dedupe: a sidecar key index next to the CSV (`<output>.keys`),
//! one `post_fullname\tcomment_id` line per row ever written.

use crate::util::{open_append_with_backoff, open_with_backoff};
use ahash::AHashSet;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct KeyIndex {
    path: PathBuf,
    seen: AHashSet<String>,
    w: BufWriter<File>,
}

impl KeyIndex {
    /// Sidecar path for a given output file.
    pub fn path_for(output: &Path) -> PathBuf {
        let mut s = output.as_os_str().to_owned();
        s.push(".keys");
        PathBuf::from(s)
    }

    /// Load existing keys (if any) and open the index for appending.
    pub fn open(output: &Path) -> Result<Self> {
        let path = Self::path_for(output);
        let mut seen = AHashSet::new();
        match open_with_backoff(&path, 16, 50) {
            Ok(f) => {
                for line in BufReader::new(f).lines() {
                    let line = line.with_context(|| format!("read {}", path.display()))?;
                    let line = line.trim_end_matches('\r');
                    if !line.is_empty() {
                        seen.insert(line.to_string());
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).with_context(|| format!("open {}", path.display())),
        }
        let f = open_append_with_backoff(&path, 16, 50).with_context(|| format!("open {}", path.display()))?;
        tracing::debug!(path = %path.display(), keys = seen.len(), "loaded dedupe index");
        Ok(Self { path, seen, w: BufWriter::new(f) })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    /// Record a key. Returns false if it was already present.
    pub fn insert(&mut self, key: String) -> io::Result<bool> {
        if self.seen.contains(&key) {
            return Ok(false);
        }
        self.w.write_all(key.as_bytes())?;
        self.w.write_all(b"\n")?;
        self.seen.insert(key);
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.w.flush().with_context(|| format!("flush {}", self.path.display()))
    }
}
