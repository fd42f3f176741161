use super::domain::{
    CustomerId, MobileNumber, NewRegistration, Registration, RegistrationId, RegistrationPatch,
    ReviewEntry,
};
use super::query::RegistrationFilter;
use crate::store::RepositoryError;

/// Storage surface for registrations.
///
/// Implementations must enforce uniqueness of mobile number and customer id inside
/// `insert` itself, returning [`RepositoryError::Conflict`]; callers' pre-checks are
/// advisory only. `select` returns records ordered by `created_at` descending.
pub trait RegistrationRepository: Send + Sync {
    fn insert(&self, registration: NewRegistration) -> Result<Registration, RepositoryError>;
    fn fetch(&self, id: &RegistrationId) -> Result<Option<Registration>, RepositoryError>;
    fn find_by_mobile(
        &self,
        mobile_number: &MobileNumber,
    ) -> Result<Option<Registration>, RepositoryError>;
    fn find_by_customer_id(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<Registration>, RepositoryError>;
    fn select(&self, filter: &RegistrationFilter) -> Result<Vec<Registration>, RepositoryError>;
    fn count(&self, filter: &RegistrationFilter) -> Result<usize, RepositoryError>;
    fn update(
        &self,
        id: &RegistrationId,
        patch: RegistrationPatch,
    ) -> Result<Registration, RepositoryError>;
    /// Applies a status patch and appends its review entry as one write. On error
    /// neither is visible.
    fn apply_review(
        &self,
        id: &RegistrationId,
        patch: RegistrationPatch,
        entry: ReviewEntry,
    ) -> Result<Registration, RepositoryError>;
    fn reviews(&self, id: &RegistrationId) -> Result<Vec<ReviewEntry>, RepositoryError>;
}
