use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::snapshot::{Sequences, SnapshotError, StoreSnapshot};
use super::{RepositoryError, UniqueField};
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

/// Process-local store. Every table sits behind its own mutex and unique indexes are
/// checked in the same critical section as the write they guard.
#[derive(Default)]
pub struct InMemoryStore {
    registrations: Mutex<RegistrationTable>,
    categories: Mutex<CategoryTable>,
    panchayaths: Mutex<PanchayathTable>,
}

#[derive(Default)]
struct RegistrationTable {
    rows: Vec<Registration>,
    by_id: HashMap<RegistrationId, usize>,
    by_mobile: HashMap<MobileNumber, usize>,
    by_customer_id: HashMap<CustomerId, usize>,
    reviews: Vec<ReviewEntry>,
    sequence: u64,
}

impl RegistrationTable {
    fn admit(&mut self, registration: Registration) -> Result<&Registration, RepositoryError> {
        if self.by_mobile.contains_key(&registration.mobile_number) {
            return Err(RepositoryError::Conflict {
                field: UniqueField::MobileNumber,
            });
        }
        if self.by_customer_id.contains_key(&registration.customer_id) {
            return Err(RepositoryError::Conflict {
                field: UniqueField::CustomerId,
            });
        }

        let slot = self.rows.len();
        self.by_id.insert(registration.id.clone(), slot);
        self.by_mobile
            .insert(registration.mobile_number.clone(), slot);
        self.by_customer_id
            .insert(registration.customer_id.clone(), slot);
        self.rows.push(registration);
        Ok(&self.rows[slot])
    }

    fn next_id(&mut self) -> RegistrationId {
        self.sequence += 1;
        RegistrationId(format!("reg-{:06}", self.sequence))
    }

    fn row(&self, index: Option<&usize>) -> Option<Registration> {
        index.and_then(|slot| self.rows.get(*slot)).cloned()
    }

    fn patch(
        &mut self,
        id: &RegistrationId,
        patch: RegistrationPatch,
    ) -> Result<Registration, RepositoryError> {
        let slot = *self.by_id.get(id).ok_or(RepositoryError::NotFound)?;
        let row = self.rows.get_mut(slot).ok_or(RepositoryError::NotFound)?;

        if let Some(status) = patch.status {
            row.status = status;
        }
        if let Some(category) = patch.category {
            row.category = category;
        }
        row.updated_at = patch.updated_at;
        Ok(row.clone())
    }
}

#[derive(Default)]
struct CategoryTable {
    rows: Vec<Category>,
    sequence: u64,
}

impl CategoryTable {
    fn name_taken(&self, name: &str, except: Option<&CategoryId>) -> bool {
        self.rows
            .iter()
            .any(|category| category.name == name && Some(&category.id) != except)
    }

    fn find_mut(&mut self, id: &CategoryId) -> Result<&mut Category, RepositoryError> {
        self.rows
            .iter_mut()
            .find(|category| &category.id == id)
            .ok_or(RepositoryError::NotFound)
    }
}

#[derive(Default)]
struct PanchayathTable {
    rows: Vec<Panchayath>,
    sequence: u64,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, table: &str) -> Result<MutexGuard<'a, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable(format!("{table} table lock poisoned")))
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the store and its indexes from a snapshot.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, SnapshotError> {
        let mut registrations = RegistrationTable {
            sequence: snapshot.sequences.registration,
            reviews: snapshot.reviews,
            ..RegistrationTable::default()
        };
        for registration in snapshot.registrations {
            registrations
                .admit(registration)
                .map_err(SnapshotError::Inconsistent)?;
        }

        let mut categories = CategoryTable {
            sequence: snapshot.sequences.category,
            ..CategoryTable::default()
        };
        for category in snapshot.categories {
            if categories.name_taken(&category.name, None) {
                return Err(SnapshotError::Inconsistent(RepositoryError::Conflict {
                    field: UniqueField::CategoryName,
                }));
            }
            categories.rows.push(category);
        }

        let panchayaths = PanchayathTable {
            rows: snapshot.panchayaths,
            sequence: snapshot.sequences.panchayath,
        };

        Ok(Self {
            registrations: Mutex::new(registrations),
            categories: Mutex::new(categories),
            panchayaths: Mutex::new(panchayaths),
        })
    }

    /// Copies every table out, registrations in insertion order.
    pub fn snapshot(&self) -> Result<StoreSnapshot, RepositoryError> {
        let registrations = lock(&self.registrations, "registrations")?;
        let categories = lock(&self.categories, "categories")?;
        let panchayaths = lock(&self.panchayaths, "panchayaths")?;

        Ok(StoreSnapshot {
            registrations: registrations.rows.clone(),
            reviews: registrations.reviews.clone(),
            categories: categories.rows.clone(),
            panchayaths: panchayaths.rows.clone(),
            sequences: Sequences {
                registration: registrations.sequence,
                category: categories.sequence,
                panchayath: panchayaths.sequence,
            },
        })
    }
}

impl RegistrationRepository for InMemoryStore {
    fn insert(&self, registration: NewRegistration) -> Result<Registration, RepositoryError> {
        let mut table = lock(&self.registrations, "registrations")?;
        if table.by_mobile.contains_key(&registration.mobile_number) {
            return Err(RepositoryError::Conflict {
                field: UniqueField::MobileNumber,
            });
        }
        let id = table.next_id();
        let stored = table.admit(registration.into_registration(id))?;
        Ok(stored.clone())
    }

    fn fetch(&self, id: &RegistrationId) -> Result<Option<Registration>, RepositoryError> {
        let table = lock(&self.registrations, "registrations")?;
        Ok(table.row(table.by_id.get(id)))
    }

    fn find_by_mobile(
        &self,
        mobile_number: &MobileNumber,
    ) -> Result<Option<Registration>, RepositoryError> {
        let table = lock(&self.registrations, "registrations")?;
        Ok(table.row(table.by_mobile.get(mobile_number)))
    }

    fn find_by_customer_id(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<Registration>, RepositoryError> {
        let table = lock(&self.registrations, "registrations")?;
        Ok(table.row(table.by_customer_id.get(customer_id)))
    }

    fn select(&self, filter: &RegistrationFilter) -> Result<Vec<Registration>, RepositoryError> {
        let table = lock(&self.registrations, "registrations")?;
        let mut rows: Vec<Registration> = table
            .rows
            .iter()
            .rev()
            .filter(|registration| filter.matches(registration))
            .cloned()
            .collect();
        rows.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(rows)
    }

    fn count(&self, filter: &RegistrationFilter) -> Result<usize, RepositoryError> {
        let table = lock(&self.registrations, "registrations")?;
        Ok(table
            .rows
            .iter()
            .filter(|registration| filter.matches(registration))
            .count())
    }

    fn update(
        &self,
        id: &RegistrationId,
        patch: RegistrationPatch,
    ) -> Result<Registration, RepositoryError> {
        let mut table = lock(&self.registrations, "registrations")?;
        table.patch(id, patch)
    }

    fn apply_review(
        &self,
        id: &RegistrationId,
        patch: RegistrationPatch,
        entry: ReviewEntry,
    ) -> Result<Registration, RepositoryError> {
        let mut table = lock(&self.registrations, "registrations")?;
        if &entry.registration_id != id {
            return Err(RepositoryError::NotFound);
        }
        let updated = table.patch(id, patch)?;
        table.reviews.push(entry);
        Ok(updated)
    }

    fn reviews(&self, id: &RegistrationId) -> Result<Vec<ReviewEntry>, RepositoryError> {
        let table = lock(&self.registrations, "registrations")?;
        Ok(table
            .reviews
            .iter()
            .filter(|entry| &entry.registration_id == id)
            .cloned()
            .collect())
    }
}

impl CategoryRepository for InMemoryStore {
    fn insert(
        &self,
        draft: CategoryDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Category, RepositoryError> {
        let mut table = lock(&self.categories, "categories")?;
        if table.name_taken(&draft.name, None) {
            return Err(RepositoryError::Conflict {
                field: UniqueField::CategoryName,
            });
        }

        table.sequence += 1;
        let category = Category {
            id: CategoryId(format!("cat-{:06}", table.sequence)),
            name: draft.name,
            description: draft.description,
            actual_fee: draft.actual_fee,
            offer_fee: draft.offer_fee,
            image_url: draft.image_url,
            popup_image_url: draft.popup_image_url,
            is_active: draft.is_active,
            created_at,
        };
        table.rows.push(category.clone());
        Ok(category)
    }

    fn fetch(&self, id: &CategoryId) -> Result<Option<Category>, RepositoryError> {
        let table = lock(&self.categories, "categories")?;
        Ok(table.rows.iter().find(|category| &category.id == id).cloned())
    }

    fn update(&self, id: &CategoryId, draft: CategoryDraft) -> Result<Category, RepositoryError> {
        let mut table = lock(&self.categories, "categories")?;
        if table.name_taken(&draft.name, Some(id)) {
            return Err(RepositoryError::Conflict {
                field: UniqueField::CategoryName,
            });
        }

        let category = table.find_mut(id)?;
        category.name = draft.name;
        category.description = draft.description;
        category.actual_fee = draft.actual_fee;
        category.offer_fee = draft.offer_fee;
        category.image_url = draft.image_url;
        category.popup_image_url = draft.popup_image_url;
        category.is_active = draft.is_active;
        Ok(category.clone())
    }

    fn set_active(&self, id: &CategoryId, is_active: bool) -> Result<Category, RepositoryError> {
        let mut table = lock(&self.categories, "categories")?;
        let category = table.find_mut(id)?;
        category.is_active = is_active;
        Ok(category.clone())
    }

    fn list(&self, active_only: bool) -> Result<Vec<Category>, RepositoryError> {
        let table = lock(&self.categories, "categories")?;
        let mut rows: Vec<Category> = table
            .rows
            .iter()
            .filter(|category| !active_only || category.is_active)
            .cloned()
            .collect();
        rows.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(rows)
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Ok(lock(&self.categories, "categories")?.rows.len())
    }
}

impl PanchayathRepository for InMemoryStore {
    fn insert(
        &self,
        draft: PanchayathDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Panchayath, RepositoryError> {
        let mut table = lock(&self.panchayaths, "panchayaths")?;
        table.sequence += 1;
        let panchayath = Panchayath {
            id: PanchayathId(format!("pan-{:06}", table.sequence)),
            name: draft.name,
            district: draft.district,
            created_at,
        };
        table.rows.push(panchayath.clone());
        Ok(panchayath)
    }

    fn update(
        &self,
        id: &PanchayathId,
        draft: PanchayathDraft,
    ) -> Result<Panchayath, RepositoryError> {
        let mut table = lock(&self.panchayaths, "panchayaths")?;
        let panchayath = table
            .rows
            .iter_mut()
            .find(|panchayath| &panchayath.id == id)
            .ok_or(RepositoryError::NotFound)?;
        panchayath.name = draft.name;
        panchayath.district = draft.district;
        Ok(panchayath.clone())
    }

    fn delete(&self, id: &PanchayathId) -> Result<(), RepositoryError> {
        let mut table = lock(&self.panchayaths, "panchayaths")?;
        let position = table
            .rows
            .iter()
            .position(|panchayath| &panchayath.id == id)
            .ok_or(RepositoryError::NotFound)?;
        table.rows.remove(position);
        Ok(())
    }

    fn list(&self) -> Result<Vec<Panchayath>, RepositoryError> {
        let table = lock(&self.panchayaths, "panchayaths")?;
        let mut rows = table.rows.clone();
        rows.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(rows)
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Ok(lock(&self.panchayaths, "panchayaths")?.rows.len())
    }
}
