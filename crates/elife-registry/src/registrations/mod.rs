//! Registration intake, the approval state machine, and the admin query/export
//! pipeline.
//!
//! Public callers only ever submit and check status. Everything else takes the
//! acting [`AdminSession`](crate::access::AdminSession) and passes it through the
//! authorization gate before touching the repository.

pub mod domain;
pub mod export;
pub mod identity;
pub mod lifecycle;
pub mod query;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    CustomerId, MobileNumber, NewRegistration, Registration, RegistrationId, RegistrationPatch,
    RegistrationStatus, RegistrationStatusView, RegistrationSubmission, ReviewEntry,
};
pub use export::{export_file_name, ExportError, ExportTable, EXPORT_COLUMNS};
pub use identity::{derive_customer_id, StatusLookup, CUSTOMER_ID_PREFIX};
pub use lifecycle::{
    is_permitted, transition, Clock, InvalidTransition, ReviewAction, SystemClock, REVIEWER_ROLE,
};
pub use query::{
    filter_registrations, Facets, RegistrationFilter, RegistrationSnapshot, RegistrationStats,
};
pub use repository::RegistrationRepository;
pub use router::registration_router;
pub use service::{RegistrationService, RegistrationServiceError};
