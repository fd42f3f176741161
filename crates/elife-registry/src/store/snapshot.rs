use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{InMemoryStore, RepositoryError};
use crate::catalog::domain::{Category, Panchayath};
use crate::registrations::domain::{Registration, ReviewEntry};

/// Last identifier issued per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequences {
    pub registration: u64,
    pub category: u64,
    pub panchayath: u64,
}

/// Serialisable copy of every table, the on-disk form of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub registrations: Vec<Registration>,
    #[serde(default)]
    pub reviews: Vec<ReviewEntry>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub panchayaths: Vec<Panchayath>,
    #[serde(default)]
    pub sequences: Sequences,
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to access snapshot at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("snapshot at {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("snapshot violates store constraints: {0}")]
    Inconsistent(#[source] RepositoryError),
    #[error(transparent)]
    Store(#[from] RepositoryError),
}

impl StoreSnapshot {
    /// Reads a snapshot; a missing file yields `None`.
    pub fn read(path: &Path) -> Result<Option<Self>, SnapshotError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SnapshotError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| SnapshotError::Malformed {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn write(&self, path: &Path) -> Result<(), SnapshotError> {
        let io_error = |source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let encoded =
            serde_json::to_string_pretty(self).map_err(|source| SnapshotError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
        // Readers must never observe a half-written file.
        let mut staging = path.as_os_str().to_owned();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);
        fs::write(&staging, encoded).map_err(io_error)?;
        fs::rename(&staging, path).map_err(io_error)
    }
}

impl InMemoryStore {
    /// Opens the store persisted at `path`, or an empty one when nothing is there yet.
    pub fn open(path: &Path) -> Result<Self, SnapshotError> {
        match StoreSnapshot::read(path)? {
            Some(snapshot) => {
                tracing::debug!(
                    path = %path.display(),
                    registrations = snapshot.registrations.len(),
                    "loaded store snapshot"
                );
                Self::from_snapshot(snapshot)
            }
            None => Ok(Self::new()),
        }
    }

    pub fn persist(&self, path: &Path) -> Result<(), SnapshotError> {
        let snapshot = self.snapshot()?;
        snapshot.write(path)?;
        tracing::debug!(
            path = %path.display(),
            registrations = snapshot.registrations.len(),
            "persisted store snapshot"
        );
        Ok(())
    }
}
