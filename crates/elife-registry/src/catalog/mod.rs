//! Categories and panchayaths offered on the public registration form.
//!
//! Registrations store both by name, so nothing here cascades into them.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    Category, CategoryDraft, CategoryId, CategoryListing, Panchayath, PanchayathDraft, PanchayathId,
};
pub use repository::{CategoryRepository, PanchayathRepository};
pub use router::catalog_router;
pub use service::{CatalogService, CatalogServiceError, CATALOG_ROLE};
