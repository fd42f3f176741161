use chrono::{DateTime, Utc};

use super::domain::{Category, CategoryDraft, CategoryId, Panchayath, PanchayathDraft, PanchayathId};
use crate::store::RepositoryError;

/// Category storage. Names are unique; categories are never deleted.
pub trait CategoryRepository: Send + Sync {
    fn insert(
        &self,
        draft: CategoryDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Category, RepositoryError>;
    fn fetch(&self, id: &CategoryId) -> Result<Option<Category>, RepositoryError>;
    fn update(&self, id: &CategoryId, draft: CategoryDraft) -> Result<Category, RepositoryError>;
    fn set_active(&self, id: &CategoryId, is_active: bool) -> Result<Category, RepositoryError>;
    /// Ordered by name.
    fn list(&self, active_only: bool) -> Result<Vec<Category>, RepositoryError>;
    fn count(&self) -> Result<usize, RepositoryError>;
}

/// Panchayath storage with hard deletes.
pub trait PanchayathRepository: Send + Sync {
    fn insert(
        &self,
        draft: PanchayathDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Panchayath, RepositoryError>;
    fn update(
        &self,
        id: &PanchayathId,
        draft: PanchayathDraft,
    ) -> Result<Panchayath, RepositoryError>;
    fn delete(&self, id: &PanchayathId) -> Result<(), RepositoryError>;
    /// Ordered by name.
    fn list(&self) -> Result<Vec<Panchayath>, RepositoryError>;
    fn count(&self) -> Result<usize, RepositoryError>;
}
