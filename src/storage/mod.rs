//! Persistence of failover state
//!
//! State lives in a single JSON document (`bot_cache.json` by default) that
//! is rewritten atomically after every mutation. A missing or unreadable
//! file means "start fresh on the primary source".

pub mod state;

use std::path::PathBuf;
use thiserror::Error;

pub use state::StateStore;

/// Errors raised while reading or writing the state file
#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem failure
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// State could not be encoded
    #[error("Failed to serialize state: {0}")]
    Serialize(#[source] serde_json::Error),

    /// State file exists but is not valid JSON for the expected shape
    #[error("Corrupt state file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
