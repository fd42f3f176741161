use std::sync::Arc;

use super::domain::{
    MobileNumber, NewRegistration, Registration, RegistrationId, RegistrationPatch,
    RegistrationSubmission, ReviewEntry,
};
use super::export::{ExportError, ExportTable};
use super::identity::{derive_customer_id, StatusLookup};
use super::lifecycle::{
    next_update_stamp, transition, Clock, InvalidTransition, ReviewAction, SystemClock,
    REVIEWER_ROLE,
};
use super::query::{RegistrationFilter, RegistrationSnapshot, RegistrationStats};
use super::repository::RegistrationRepository;
use crate::access::{authorize, AccessDenied, AdminSession};
use crate::config::ExportConfig;
use crate::store::RepositoryError;
use crate::validation::{require_fields, ValidationError};

/// Service composing the duplicate guard, the approval state machine and the
/// admin read side over a registration repository.
pub struct RegistrationService<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
    export: ExportConfig,
}

impl<R> RegistrationService<R>
where
    R: RegistrationRepository + 'static,
{
    pub fn new(repository: Arc<R>, export: ExportConfig) -> Self {
        Self::with_clock(repository, Arc::new(SystemClock), export)
    }

    pub fn with_clock(repository: Arc<R>, clock: Arc<dyn Clock>, export: ExportConfig) -> Self {
        Self {
            repository,
            clock,
            export,
        }
    }

    pub fn export_config(&self) -> &ExportConfig {
        &self.export
    }

    /// Validate and admit a public submission as a pending registration.
    pub fn submit(
        &self,
        submission: RegistrationSubmission,
    ) -> Result<Registration, RegistrationServiceError> {
        let candidate = validate_submission(submission, self.clock.now())?;

        if self
            .repository
            .find_by_mobile(&candidate.mobile_number)?
            .is_some()
        {
            tracing::warn!(
                mobile_number = %candidate.mobile_number,
                "duplicate registration rejected"
            );
            return Err(RegistrationServiceError::Duplicate);
        }

        // The lookup above can race another submission; the store's unique index is
        // what actually decides.
        let stored = self.repository.insert(candidate).map_err(|error| {
            if matches!(error, RepositoryError::Conflict { .. }) {
                tracing::warn!(%error, "duplicate registration rejected by store");
            }
            RegistrationServiceError::from(error)
        })?;

        tracing::info!(
            registration_id = %stored.id,
            customer_id = %stored.customer_id,
            category = %stored.category,
            "registration submitted"
        );
        Ok(stored)
    }

    /// Public status check by mobile number or customer id.
    pub fn check_status(&self, token: &str) -> Result<Registration, RegistrationServiceError> {
        let found = match StatusLookup::parse(token)? {
            StatusLookup::Mobile(mobile_number) => {
                self.repository.find_by_mobile(&mobile_number)?
            }
            StatusLookup::Customer(customer_id) => {
                self.repository.find_by_customer_id(&customer_id)?
            }
        };
        found.ok_or(RegistrationServiceError::NotFound)
    }

    pub fn get(
        &self,
        actor: Option<&AdminSession>,
        id: &RegistrationId,
    ) -> Result<Registration, RegistrationServiceError> {
        authorize(actor, REVIEWER_ROLE)?;
        self.fetch_existing(id)
    }

    pub fn approve(
        &self,
        actor: Option<&AdminSession>,
        id: &RegistrationId,
    ) -> Result<Registration, RegistrationServiceError> {
        self.review(actor, id, ReviewAction::Approve, None)
    }

    pub fn reject(
        &self,
        actor: Option<&AdminSession>,
        id: &RegistrationId,
        reason: Option<String>,
    ) -> Result<Registration, RegistrationServiceError> {
        self.review(actor, id, ReviewAction::Reject, reason)
    }

    pub fn reopen(
        &self,
        actor: Option<&AdminSession>,
        id: &RegistrationId,
        reason: impl Into<String>,
    ) -> Result<Registration, RegistrationServiceError> {
        self.review(actor, id, ReviewAction::Reopen, Some(reason.into()))
    }

    /// Apply one status transition and append it to the review log.
    pub fn review(
        &self,
        actor: Option<&AdminSession>,
        id: &RegistrationId,
        action: ReviewAction,
        reason: Option<String>,
    ) -> Result<Registration, RegistrationServiceError> {
        let actor = authorize(actor, REVIEWER_ROLE)?;
        let reason = reason
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty());
        if action.requires_reason() && reason.is_none() {
            return Err(ValidationError::MissingFields(vec!["reason"]).into());
        }

        let current = self.fetch_existing(id)?;
        let to = transition(current.status, action)?;
        let at = next_update_stamp(current.updated_at, self.clock.now());

        let updated = self.repository.apply_review(
            id,
            RegistrationPatch {
                status: Some(to),
                category: None,
                updated_at: at,
            },
            ReviewEntry {
                registration_id: id.clone(),
                actor: actor.username.clone(),
                actor_role: actor.role,
                action,
                from: current.status,
                to,
                reason,
                at,
            },
        )?;

        tracing::info!(
            registration_id = %id,
            actor = %actor.username,
            from = %current.status,
            to = %to,
            "registration status changed"
        );
        Ok(updated)
    }

    /// Change only the category label of a registration.
    pub fn correct_category(
        &self,
        actor: Option<&AdminSession>,
        id: &RegistrationId,
        category: &str,
    ) -> Result<Registration, RegistrationServiceError> {
        let actor = authorize(actor, REVIEWER_ROLE)?;
        let category = category.trim();
        require_fields(&[("category", category)])?;

        let current = self.fetch_existing(id)?;
        let updated = self.repository.update(
            id,
            RegistrationPatch {
                status: None,
                category: Some(category.to_string()),
                updated_at: next_update_stamp(current.updated_at, self.clock.now()),
            },
        )?;

        tracing::info!(
            registration_id = %id,
            actor = %actor.username,
            from = %current.category,
            to = %updated.category,
            "registration category corrected"
        );
        Ok(updated)
    }

    pub fn review_history(
        &self,
        actor: Option<&AdminSession>,
        id: &RegistrationId,
    ) -> Result<Vec<ReviewEntry>, RegistrationServiceError> {
        authorize(actor, REVIEWER_ROLE)?;
        self.fetch_existing(id)?;
        Ok(self.repository.reviews(id)?)
    }

    /// Read the whole collection once; filtering, facets and export work off this.
    pub fn snapshot(
        &self,
        actor: Option<&AdminSession>,
    ) -> Result<RegistrationSnapshot, RegistrationServiceError> {
        authorize(actor, REVIEWER_ROLE)?;
        self.read_snapshot()
    }

    /// Build the export sheet for the filtered subset of a fresh snapshot.
    pub fn export(
        &self,
        actor: Option<&AdminSession>,
        filter: &RegistrationFilter,
    ) -> Result<ExportTable, RegistrationServiceError> {
        let snapshot = self.snapshot(actor)?;
        self.export_records(&snapshot.filter(filter))
    }

    /// Build the export sheet for records the caller already holds, in their order.
    pub fn export_records(
        &self,
        records: &[Registration],
    ) -> Result<ExportTable, RegistrationServiceError> {
        let today = self
            .clock
            .now()
            .with_timezone(&self.export.utc_offset)
            .date_naive();
        Ok(ExportTable::build(records, &self.export, today)?)
    }

    /// Status counts at read time. Callers apply their own access gate.
    pub fn stats(&self) -> Result<RegistrationStats, RegistrationServiceError> {
        Ok(self.read_snapshot()?.stats())
    }

    fn read_snapshot(&self) -> Result<RegistrationSnapshot, RegistrationServiceError> {
        let records = self.repository.select(&RegistrationFilter::all())?;
        Ok(RegistrationSnapshot::new(records, self.clock.now()))
    }

    fn fetch_existing(&self, id: &RegistrationId) -> Result<Registration, RegistrationServiceError> {
        self.repository
            .fetch(id)?
            .ok_or(RegistrationServiceError::NotFound)
    }
}

fn validate_submission(
    submission: RegistrationSubmission,
    created_at: chrono::DateTime<chrono::Utc>,
) -> Result<NewRegistration, ValidationError> {
    let category = submission.category.trim();
    let name = submission.name.trim();
    let address = submission.address.trim();
    let mobile_number = submission.mobile_number.trim();
    let panchayath = submission.panchayath.trim();
    let ward = submission.ward.trim();

    require_fields(&[
        ("category", category),
        ("name", name),
        ("address", address),
        ("mobile_number", mobile_number),
        ("panchayath", panchayath),
        ("ward", ward),
    ])?;
    let mobile_number = MobileNumber::parse(mobile_number)?;

    Ok(NewRegistration {
        customer_id: derive_customer_id(&mobile_number, name),
        category: category.to_string(),
        name: name.to_string(),
        address: address.to_string(),
        mobile_number,
        panchayath: panchayath.to_string(),
        ward: ward.to_string(),
        agent_pro: submission
            .agent_pro
            .as_deref()
            .map(str::trim)
            .filter(|agent| !agent.is_empty())
            .map(str::to_string),
        created_at,
    })
}

/// Error raised by the registration service.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("mobile number is already registered")]
    Duplicate,
    #[error(transparent)]
    Unauthorized(#[from] AccessDenied),
    #[error("registration not found")]
    NotFound,
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("registration store failure: {0}")]
    Store(RepositoryError),
}

impl From<RepositoryError> for RegistrationServiceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Conflict { .. } => Self::Duplicate,
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::Unavailable(_) => {
                tracing::error!(%error, "registration store failure");
                Self::Store(error)
            }
        }
    }
}
