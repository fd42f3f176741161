//! Persistent store surface: the in-memory tables and the locked file store that
//! shares them between processes.

mod file;
mod memory;
mod snapshot;

use std::fmt;

pub use file::FileStore;
pub use memory::InMemoryStore;
pub use snapshot::{Sequences, SnapshotError, StoreSnapshot};

/// Column a uniqueness constraint guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    MobileNumber,
    CustomerId,
    CategoryName,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UniqueField::MobileNumber => "mobile number",
            UniqueField::CustomerId => "customer id",
            UniqueField::CategoryName => "category name",
        };
        f.write_str(label)
    }
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("{field} already exists")]
    Conflict { field: UniqueField },
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
