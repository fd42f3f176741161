use std::sync::Arc;

use super::domain::{Category, CategoryDraft, CategoryId, Panchayath, PanchayathDraft, PanchayathId};
use super::repository::{CategoryRepository, PanchayathRepository};
use crate::access::{authorize, AccessDenied, AdminRole, AdminSession};
use crate::registrations::{Clock, SystemClock};
use crate::store::RepositoryError;
use crate::validation::ValidationError;

/// Minimum role for catalog mutations and admin listings.
pub const CATALOG_ROLE: AdminRole = AdminRole::LocalAdmin;

/// Reference data administrators maintain for the public form.
pub struct CatalogService<C, P> {
    categories: Arc<C>,
    panchayaths: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<C, P> CatalogService<C, P>
where
    C: CategoryRepository + 'static,
    P: PanchayathRepository + 'static,
{
    pub fn new(categories: Arc<C>, panchayaths: Arc<P>) -> Self {
        Self::with_clock(categories, panchayaths, Arc::new(SystemClock))
    }

    pub fn with_clock(categories: Arc<C>, panchayaths: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self {
            categories,
            panchayaths,
            clock,
        }
    }

    /// Active categories for the public form, by name.
    pub fn active_categories(&self) -> Result<Vec<Category>, CatalogServiceError> {
        Ok(self.categories.list(true)?)
    }

    /// Every category, newest first.
    pub fn all_categories(
        &self,
        actor: Option<&AdminSession>,
    ) -> Result<Vec<Category>, CatalogServiceError> {
        authorize(actor, CATALOG_ROLE)?;
        let mut categories = self.categories.list(false)?;
        categories.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(categories)
    }

    pub fn create_category(
        &self,
        actor: Option<&AdminSession>,
        draft: CategoryDraft,
    ) -> Result<Category, CatalogServiceError> {
        let actor = authorize(actor, CATALOG_ROLE)?;
        let draft = draft.validated()?;
        let name = draft.name.clone();

        let category = self
            .categories
            .insert(draft, self.clock.now())
            .map_err(|error| name_conflict(error, &name))?;
        tracing::info!(
            category_id = %category.id,
            name = %category.name,
            actor = %actor.username,
            "category created"
        );
        Ok(category)
    }

    /// Rename or re-price a category. Registrations keep the name they were filed under.
    pub fn update_category(
        &self,
        actor: Option<&AdminSession>,
        id: &CategoryId,
        draft: CategoryDraft,
    ) -> Result<Category, CatalogServiceError> {
        let actor = authorize(actor, CATALOG_ROLE)?;
        let draft = draft.validated()?;
        let name = draft.name.clone();

        let category = self
            .categories
            .update(id, draft)
            .map_err(|error| name_conflict(error, &name))?;
        tracing::info!(category_id = %id, actor = %actor.username, "category updated");
        Ok(category)
    }

    /// Flip `is_active`. Categories are deactivated, never deleted.
    pub fn toggle_category(
        &self,
        actor: Option<&AdminSession>,
        id: &CategoryId,
    ) -> Result<Category, CatalogServiceError> {
        let actor = authorize(actor, CATALOG_ROLE)?;
        let current = self
            .categories
            .fetch(id)?
            .ok_or(CatalogServiceError::NotFound)?;

        let category = self.categories.set_active(id, !current.is_active)?;
        tracing::info!(
            category_id = %id,
            is_active = category.is_active,
            actor = %actor.username,
            "category toggled"
        );
        Ok(category)
    }

    pub fn panchayaths(&self) -> Result<Vec<Panchayath>, CatalogServiceError> {
        Ok(self.panchayaths.list()?)
    }

    pub fn create_panchayath(
        &self,
        actor: Option<&AdminSession>,
        draft: PanchayathDraft,
    ) -> Result<Panchayath, CatalogServiceError> {
        let actor = authorize(actor, CATALOG_ROLE)?;
        let panchayath = self
            .panchayaths
            .insert(draft.validated()?, self.clock.now())?;
        tracing::info!(
            panchayath_id = %panchayath.id,
            name = %panchayath.name,
            actor = %actor.username,
            "panchayath created"
        );
        Ok(panchayath)
    }

    pub fn update_panchayath(
        &self,
        actor: Option<&AdminSession>,
        id: &PanchayathId,
        draft: PanchayathDraft,
    ) -> Result<Panchayath, CatalogServiceError> {
        let actor = authorize(actor, CATALOG_ROLE)?;
        let panchayath = self.panchayaths.update(id, draft.validated()?)?;
        tracing::info!(panchayath_id = %id, actor = %actor.username, "panchayath updated");
        Ok(panchayath)
    }

    /// Hard delete. Registrations store the panchayath name by value and are untouched.
    pub fn delete_panchayath(
        &self,
        actor: Option<&AdminSession>,
        id: &PanchayathId,
    ) -> Result<(), CatalogServiceError> {
        let actor = authorize(actor, CATALOG_ROLE)?;
        self.panchayaths.delete(id)?;
        tracing::info!(panchayath_id = %id, actor = %actor.username, "panchayath deleted");
        Ok(())
    }

    pub fn category_count(&self) -> Result<usize, CatalogServiceError> {
        Ok(self.categories.count()?)
    }

    pub fn panchayath_count(&self) -> Result<usize, CatalogServiceError> {
        Ok(self.panchayaths.count()?)
    }
}

fn name_conflict(error: RepositoryError, name: &str) -> CatalogServiceError {
    match error {
        RepositoryError::Conflict { .. } => {
            tracing::warn!(name, "duplicate category name rejected");
            CatalogServiceError::DuplicateName(name.to_string())
        }
        other => other.into(),
    }
}

/// Error raised by the catalog service.
#[derive(Debug, thiserror::Error)]
pub enum CatalogServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("a category named '{0}' already exists")]
    DuplicateName(String),
    #[error(transparent)]
    Unauthorized(#[from] AccessDenied),
    #[error("catalog entry not found")]
    NotFound,
    #[error("catalog store failure: {0}")]
    Store(RepositoryError),
}

impl From<RepositoryError> for CatalogServiceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => Self::NotFound,
            other => {
                tracing::error!(error = %other, "catalog store failure");
                Self::Store(other)
            }
        }
    }
}
