//! Snapshot-backed store shared between processes.
//!
//! Every call takes an OS-level lock on `<data_path>.lock`, reloads the snapshot
//! and runs against that fresh copy. Mutations are written back before the lock
//! is released, so the unique indexes hold across every CLI run and server that
//! points at the same file.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;

use super::snapshot::SnapshotError;
use super::{InMemoryStore, RepositoryError};
use crate::catalog::domain::{
    Category, CategoryDraft, CategoryId, Panchayath, PanchayathDraft, PanchayathId,
};
use crate::catalog::repository::{CategoryRepository, PanchayathRepository};
use crate::registrations::domain::{
    CustomerId, MobileNumber, NewRegistration, Registration, RegistrationId, RegistrationPatch,
    ReviewEntry,
};
use crate::registrations::query::RegistrationFilter;
use crate::registrations::repository::RegistrationRepository;

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

/// Held for the duration of one store call.
struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    fn acquire(path: &Path, access: Access) -> Result<Self, RepositoryError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| lock_failure(path, err))?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|err| lock_failure(path, err))?;

        let locked = match access {
            Access::Read => FileExt::lock_shared(&file),
            Access::Write => FileExt::lock_exclusive(&file),
        };
        locked.map_err(|err| lock_failure(path, err))?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            tracing::error!(path = %self.path.display(), error = %err, "failed to release store lock");
        }
    }
}

fn lock_failure(path: &Path, err: std::io::Error) -> RepositoryError {
    RepositoryError::Unavailable(format!("store lock {}: {err}", path.display()))
}

fn unavailable(err: SnapshotError) -> RepositoryError {
    match err {
        SnapshotError::Store(err) => err,
        other => RepositoryError::Unavailable(other.to_string()),
    }
}

impl FileStore {
    /// Store persisted at `path`. Nothing is touched until the first call.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_path = OsString::from(path.as_os_str());
        lock_path.push(".lock");
        Self {
            path,
            lock_path: PathBuf::from(lock_path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Checks that the snapshot can be read and satisfies the store constraints.
    pub fn verify(&self) -> Result<(), SnapshotError> {
        let _lock = StoreLock::acquire(&self.lock_path, Access::Read)?;
        InMemoryStore::open(&self.path).map(|_| ())
    }

    fn read<T>(
        &self,
        op: impl FnOnce(&InMemoryStore) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let _lock = StoreLock::acquire(&self.lock_path, Access::Read)?;
        let store = InMemoryStore::open(&self.path).map_err(unavailable)?;
        op(&store)
    }

    fn write<T>(
        &self,
        op: impl FnOnce(&InMemoryStore) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let _lock = StoreLock::acquire(&self.lock_path, Access::Write)?;
        let store = InMemoryStore::open(&self.path).map_err(unavailable)?;
        let outcome = op(&store)?;
        store.persist(&self.path).map_err(unavailable)?;
        Ok(outcome)
    }
}

impl RegistrationRepository for FileStore {
    fn insert(&self, registration: NewRegistration) -> Result<Registration, RepositoryError> {
        self.write(|store| RegistrationRepository::insert(store, registration))
    }

    fn fetch(&self, id: &RegistrationId) -> Result<Option<Registration>, RepositoryError> {
        self.read(|store| RegistrationRepository::fetch(store, id))
    }

    fn find_by_mobile(
        &self,
        mobile_number: &MobileNumber,
    ) -> Result<Option<Registration>, RepositoryError> {
        self.read(|store| store.find_by_mobile(mobile_number))
    }

    fn find_by_customer_id(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<Registration>, RepositoryError> {
        self.read(|store| store.find_by_customer_id(customer_id))
    }

    fn select(&self, filter: &RegistrationFilter) -> Result<Vec<Registration>, RepositoryError> {
        self.read(|store| store.select(filter))
    }

    fn count(&self, filter: &RegistrationFilter) -> Result<usize, RepositoryError> {
        self.read(|store| RegistrationRepository::count(store, filter))
    }

    fn update(
        &self,
        id: &RegistrationId,
        patch: RegistrationPatch,
    ) -> Result<Registration, RepositoryError> {
        self.write(|store| RegistrationRepository::update(store, id, patch))
    }

    fn apply_review(
        &self,
        id: &RegistrationId,
        patch: RegistrationPatch,
        entry: ReviewEntry,
    ) -> Result<Registration, RepositoryError> {
        self.write(|store| store.apply_review(id, patch, entry))
    }

    fn reviews(&self, id: &RegistrationId) -> Result<Vec<ReviewEntry>, RepositoryError> {
        self.read(|store| store.reviews(id))
    }
}

impl CategoryRepository for FileStore {
    fn insert(
        &self,
        draft: CategoryDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Category, RepositoryError> {
        self.write(|store| CategoryRepository::insert(store, draft, created_at))
    }

    fn fetch(&self, id: &CategoryId) -> Result<Option<Category>, RepositoryError> {
        self.read(|store| CategoryRepository::fetch(store, id))
    }

    fn update(&self, id: &CategoryId, draft: CategoryDraft) -> Result<Category, RepositoryError> {
        self.write(|store| CategoryRepository::update(store, id, draft))
    }

    fn set_active(&self, id: &CategoryId, is_active: bool) -> Result<Category, RepositoryError> {
        self.write(|store| store.set_active(id, is_active))
    }

    fn list(&self, active_only: bool) -> Result<Vec<Category>, RepositoryError> {
        self.read(|store| CategoryRepository::list(store, active_only))
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        self.read(|store| CategoryRepository::count(store))
    }
}

impl PanchayathRepository for FileStore {
    fn insert(
        &self,
        draft: PanchayathDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Panchayath, RepositoryError> {
        self.write(|store| PanchayathRepository::insert(store, draft, created_at))
    }

    fn update(
        &self,
        id: &PanchayathId,
        draft: PanchayathDraft,
    ) -> Result<Panchayath, RepositoryError> {
        self.write(|store| PanchayathRepository::update(store, id, draft))
    }

    fn delete(&self, id: &PanchayathId) -> Result<(), RepositoryError> {
        self.write(|store| store.delete(id))
    }

    fn list(&self) -> Result<Vec<Panchayath>, RepositoryError> {
        self.read(|store| PanchayathRepository::list(store))
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        self.read(|store| PanchayathRepository::count(store))
    }
}
