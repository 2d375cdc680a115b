//! File-backed entry store: one JSON file per key under a cache directory.
//! Writes go to a temp file in the same directory and are renamed into
//! place, so readers see either the old entry or the new one.

use crate::entry::{parse_key, CacheEntry};
use autopilot_core::{AutopilotError, AutopilotResult};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

const ENTRY_EXT: &str = "json";
const TEMP_MARKER: &str = ".tmp-";

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{ENTRY_EXT}"))
    }

    /// Read and parse the entry for `key`. Missing, unreadable and corrupt
    /// files all come back as `None`.
    pub fn read(&self, key: &str) -> Option<CacheEntry> {
        let path = self.entry_path(key);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cache entry unreadable, treating as miss");
                metrics::counter!("cache.file.corrupt").increment(1);
                return None;
            }
        };
        match serde_json::from_slice::<CacheEntry>(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cache entry corrupt, treating as miss");
                metrics::counter!("cache.file.corrupt").increment(1);
                None
            }
        }
    }

    /// Replace the entry for `key`.
    pub fn write(&self, key: &str, entry: &CacheEntry) -> AutopilotResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            AutopilotError::Cache(format!("failed to create {}: {e}", self.dir.display()))
        })?;

        let json = serde_json::to_vec_pretty(entry)?;
        let final_path = self.entry_path(key);
        let temp_path = self
            .dir
            .join(format!("{key}.{ENTRY_EXT}{TEMP_MARKER}{}", Uuid::new_v4().simple()));

        let written = (|| -> std::io::Result<()> {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
            fs::rename(&temp_path, &final_path)
        })();

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(AutopilotError::Cache(format!(
                "failed to write {}: {e}",
                final_path.display()
            )));
        }
        debug!(path = %final_path.display(), bytes = json.len(), "Cache entry written");
        Ok(())
    }

    /// Delete every entry and leftover temp file this store wrote. Files
    /// whose stem is not a cache key are left alone. Returns how many entries
    /// were removed; a missing directory counts as already empty.
    pub fn clear(&self) -> AutopilotResult<usize> {
        let dir = match fs::read_dir(&self.dir) {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(AutopilotError::Cache(format!(
                    "failed to list {}: {e}",
                    self.dir.display()
                )))
            }
        };

        let entry_suffix = format!(".{ENTRY_EXT}");
        let temp_infix = format!("{entry_suffix}{TEMP_MARKER}");
        let mut removed = 0;
        for item in dir {
            let Ok(item) = item else { continue };
            let path = item.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let (stem, is_entry) = match name.split_once(temp_infix.as_str()) {
                Some((stem, _)) => (stem, false),
                None => match name.strip_suffix(entry_suffix.as_str()) {
                    Some(stem) => (stem, true),
                    None => continue,
                },
            };
            if parse_key(stem).is_none() {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += usize::from(is_entry),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(AutopilotError::Cache(format!(
                        "failed to remove {}: {e}",
                        path.display()
                    )))
                }
            }
        }
        Ok(removed)
    }
}
