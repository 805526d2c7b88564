//! JSON state file with atomic replace
//!
//! # Example
//!
//! ```no_run
//! use stockwatch::failover::FailoverState;
//! use stockwatch::storage::StateStore;
//!
//! # fn example() -> Result<(), stockwatch::storage::StorageError> {
//! let store = StateStore::new("bot_cache.json");
//! let mut state: FailoverState = store.load_or_default();
//! state.repeated_data_count += 1;
//! store.save(&state)?;
//! # Ok(())
//! # }
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::StorageError;

/// Single-document JSON store
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the state file currently exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load state, `Ok(None)` when the file does not exist
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, StorageError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };

        let reader = BufReader::new(file);
        let state = serde_json::from_reader(reader).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(path = %self.path.display(), "State loaded");
        Ok(Some(state))
    }

    /// Load state, falling back to `T::default()` on any failure
    pub fn load_or_default<T: DeserializeOwned + Default>(&self) -> T {
        match self.load() {
            Ok(Some(state)) => state,
            Ok(None) => {
                tracing::info!(path = %self.path.display(), "No state file, starting fresh");
                T::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load state, starting fresh");
                T::default()
            }
        }
    }

    /// Save state
    ///
    /// Writes to a sibling temp file first, then renames over the target.
    pub fn save<T: Serialize>(&self, state: &T) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let temp_path = self.temp_path();
        let file = File::create(&temp_path).map_err(|e| StorageError::io(&temp_path, e))?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, state).map_err(StorageError::Serialize)?;
        writer
            .flush()
            .map_err(|e| StorageError::io(&temp_path, e))?;
        drop(writer);

        fs::rename(&temp_path, &self.path).map_err(|e| StorageError::io(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), "State saved");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
