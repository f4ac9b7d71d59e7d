//! Disk-backed response cache
//!
//! The store maps query signatures to payload files inside one cache
//! directory. The layout is the interop contract with prior runs:
//! `audit_hist_list.txt` holds one `signature|filename` line per entry,
//! next to sequentially numbered `<N>.json` payload files. Signatures with
//! explicit time bounds describe immutable history and never expire;
//! open-ended signatures go stale after the configured validity window.
use crate::error::Result;
use crate::query::{END_TIME_FLAG, START_TIME_FLAG};
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Name of the signature index file inside the cache directory
pub const INDEX_FILE_NAME: &str = "audit_hist_list.txt";

const SECONDS_PER_DAY: u64 = 86_400;

/// A signature carries explicit time bounds iff both bound flags appear
fn is_time_bounded(signature: &str) -> bool {
    signature.contains(START_TIME_FLAG) && signature.contains(END_TIME_FLAG)
}

struct CacheIndex {
    entries: HashMap<String, String>,
    next_id: u64,
}

/// Persistent signature-keyed store of raw query responses
pub struct CacheStore {
    dir: PathBuf,
    validity: Duration,
    index: Mutex<CacheIndex>,
}

impl CacheStore {
    /// Open (or create) the cache directory and load its index.
    ///
    /// Malformed index lines are skipped with a warning; payload numbering
    /// continues after the highest number already present.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the index
    /// file cannot be read.
    pub fn open(dir: impl Into<PathBuf>, validity_days: u32) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let mut entries = HashMap::new();
        let mut next_id: u64 = 1;

        let index_path = dir.join(INDEX_FILE_NAME);
        if index_path.exists() {
            for line in fs::read_to_string(&index_path)?.lines() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                // Signatures may contain `|`, filenames never do
                let Some((signature, filename)) = line.rsplit_once('|') else {
                    warn!("skipping malformed cache index line: {line}");
                    continue;
                };
                if let Some(stem) = filename.strip_suffix(".json")
                    && let Ok(id) = stem.parse::<u64>()
                {
                    next_id = next_id.max(id.saturating_add(1));
                }
                entries.insert(signature.to_string(), filename.to_string());
            }
            debug!(
                "loaded {} cache entries from {}",
                entries.len(),
                index_path.display()
            );
        }

        Ok(Self {
            dir,
            validity: Duration::from_secs(
                u64::from(validity_days).saturating_mul(SECONDS_PER_DAY),
            ),
            index: Mutex::new(CacheIndex { entries, next_id }),
        })
    }

    /// Look a signature up.
    ///
    /// Returns `None` when there is no entry, when an open-ended entry has
    /// outlived the validity window, or when the payload cannot be read or
    /// parsed (corrupt entries are misses, not errors).
    pub fn lookup(&self, signature: &str) -> Option<Value> {
        let filename = {
            let index = self.index.lock().unwrap_or_else(PoisonError::into_inner);
            index.entries.get(signature).cloned()
        }?;

        let path = self.dir.join(&filename);

        if !is_time_bounded(signature) && self.is_stale(&path) {
            debug!("cache entry for `{signature}` is stale");
            return None;
        }

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("failed to read cache payload {}: {e}", path.display());
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!("discarding corrupt cache payload {}: {e}", path.display());
                None
            }
        }
    }

    /// Record a payload under a signature.
    ///
    /// A known signature has its payload file overwritten in place; a new
    /// signature gets the next sequential payload file and one appended
    /// index line.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload or index cannot be written.
    pub fn store(&self, signature: &str, payload: &Value) -> Result<()> {
        let serialized = serde_json::to_string(payload)?;
        let mut index = self.index.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(filename) = index.entries.get(signature) {
            fs::write(self.dir.join(filename), serialized)?;
            debug!("refreshed cache entry for `{signature}`");
            return Ok(());
        }

        let filename = format!("{}.json", index.next_id);
        fs::write(self.dir.join(&filename), serialized)?;

        let mut index_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(INDEX_FILE_NAME))?;
        index_file.write_all(format!("{signature}|{filename}\n").as_bytes())?;

        index.next_id = index.next_id.saturating_add(1);
        index.entries.insert(signature.to_string(), filename);
        Ok(())
    }

    fn is_stale(&self, path: &Path) -> bool {
        let age = fs::metadata(path)
            .and_then(|metadata| metadata.modified())
            .ok()
            .and_then(|modified| modified.elapsed().ok());
        match age {
            Some(age) => age > self.validity,
            // An unreadable timestamp is resolved by the payload read
            None => false,
        }
    }
}
