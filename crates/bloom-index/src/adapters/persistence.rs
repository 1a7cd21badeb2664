//! # Index Persistence
//!
//! Loads and saves the counting filter's raw counter bytes to a single
//! fixed-size file. Since the filter's size is derived from the datastore's
//! quota, the file never grows or shrinks across saves.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Reads and writes a bloom index's raw byte snapshot at a fixed path.
pub struct FileIndexStore {
    path: PathBuf,
}

impl FileIndexStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `None` if the file doesn't exist yet (cold start).
    pub fn load(&self) -> io::Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Writes `bytes` to the index file, replacing any previous contents.
    pub fn save(&self, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, bytes)
    }
}
