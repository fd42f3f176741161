use std::sync::{Arc, Mutex, OnceLock};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::access::{with_admin_sessions, AdminRole, AdminSession, SessionTokens};
use crate::config::ExportConfig;
use crate::registrations::domain::{
    CustomerId, MobileNumber, NewRegistration, Registration, RegistrationId, RegistrationPatch,
    RegistrationStatus, RegistrationSubmission, ReviewEntry,
};
use crate::registrations::lifecycle::Clock;
use crate::registrations::query::RegistrationFilter;
use crate::registrations::repository::RegistrationRepository;
use crate::registrations::{registration_router, RegistrationService};
use crate::store::{InMemoryStore, RepositoryError, UniqueField};

pub(super) fn opened_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 4, 30, 0).unwrap()
}

/// Clock tests move by hand. Reads never advance it.
pub(super) struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub(super) fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub(super) fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now += by;
    }

    pub(super) fn rewind(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now -= by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

pub(super) fn submission() -> RegistrationSubmission {
    RegistrationSubmission {
        category: "FarmeLife".to_string(),
        name: "Asha".to_string(),
        address: "X".to_string(),
        mobile_number: "9876543210".to_string(),
        panchayath: "Kadavoor".to_string(),
        ward: "3".to_string(),
        agent_pro: None,
    }
}

pub(super) fn submission_for(mobile: &str, name: &str, category: &str) -> RegistrationSubmission {
    RegistrationSubmission {
        mobile_number: mobile.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        ..submission()
    }
}

pub(super) fn local_admin() -> AdminSession {
    AdminSession::new("meera", AdminRole::LocalAdmin)
}

pub(super) fn user_admin() -> AdminSession {
    AdminSession::new("ravi", AdminRole::UserAdmin)
}

pub(super) fn super_admin() -> AdminSession {
    AdminSession::new("director", AdminRole::SuperAdmin)
}

pub(super) fn build_service() -> (
    RegistrationService<InMemoryStore>,
    Arc<InMemoryStore>,
    Arc<ManualClock>,
) {
    let repository = Arc::new(InMemoryStore::new());
    let clock = Arc::new(ManualClock::starting_at(opened_at()));
    let service =
        RegistrationService::with_clock(repository.clone(), clock.clone(), ExportConfig::default());
    (service, repository, clock)
}

/// Session table shared by every routing test; each request logs in afresh.
pub(super) fn session_tokens() -> Arc<SessionTokens> {
    static TOKENS: OnceLock<Arc<SessionTokens>> = OnceLock::new();
    TOKENS.get_or_init(|| Arc::new(SessionTokens::new())).clone()
}

pub(super) fn registration_router_with_service(
    service: RegistrationService<InMemoryStore>,
) -> axum::Router {
    with_admin_sessions(registration_router(Arc::new(service)), session_tokens())
}

/// Seeds three registrations a minute apart: Asha (FarmeLife, Kadavoor), Binu
/// (FoodeLife, Kadavoor) and Chitra (FarmeLife, Piravom).
pub(super) fn seed(
    service: &RegistrationService<InMemoryStore>,
    clock: &ManualClock,
) -> Vec<Registration> {
    let mut chitra = submission_for("9000000003", "Chitra", "FarmeLife");
    chitra.panchayath = "Piravom".to_string();

    [
        submission_for("9000000001", "Asha", "FarmeLife"),
        submission_for("9000000002", "Binu", "FoodeLife"),
        chitra,
    ]
    .into_iter()
    .map(|submission| {
        clock.advance(Duration::minutes(1));
        service.submit(submission).expect("seed submission")
    })
    .collect()
}

pub(super) fn registration(
    id: &str,
    category: &str,
    panchayath: &str,
    status: RegistrationStatus,
    minute: i64,
) -> Registration {
    let created_at = opened_at() + Duration::minutes(minute);
    Registration {
        id: RegistrationId(id.to_string()),
        customer_id: CustomerId(format!("ESEP90000000{minute:02}A")),
        category: category.to_string(),
        name: "Asha".to_string(),
        address: "Near temple".to_string(),
        mobile_number: MobileNumber::parse(&format!("90000000{minute:02}")).expect("mobile"),
        panchayath: panchayath.to_string(),
        ward: "3".to_string(),
        agent_pro: None,
        status,
        created_at,
        updated_at: created_at,
    }
}

/// Lookups never see existing rows, as if a concurrent submission landed between the
/// pre-check and the insert.
pub(super) struct RacingRepository;

impl RegistrationRepository for RacingRepository {
    fn insert(&self, _registration: NewRegistration) -> Result<Registration, RepositoryError> {
        Err(RepositoryError::Conflict {
            field: UniqueField::MobileNumber,
        })
    }

    fn fetch(&self, _id: &RegistrationId) -> Result<Option<Registration>, RepositoryError> {
        Ok(None)
    }

    fn find_by_mobile(
        &self,
        _mobile_number: &MobileNumber,
    ) -> Result<Option<Registration>, RepositoryError> {
        Ok(None)
    }

    fn find_by_customer_id(
        &self,
        _customer_id: &CustomerId,
    ) -> Result<Option<Registration>, RepositoryError> {
        Ok(None)
    }

    fn select(&self, _filter: &RegistrationFilter) -> Result<Vec<Registration>, RepositoryError> {
        Ok(Vec::new())
    }

    fn count(&self, _filter: &RegistrationFilter) -> Result<usize, RepositoryError> {
        Ok(0)
    }

    fn update(
        &self,
        _id: &RegistrationId,
        _patch: RegistrationPatch,
    ) -> Result<Registration, RepositoryError> {
        Err(RepositoryError::NotFound)
    }

    fn apply_review(
        &self,
        _id: &RegistrationId,
        _patch: RegistrationPatch,
        _entry: ReviewEntry,
    ) -> Result<Registration, RepositoryError> {
        Err(RepositoryError::NotFound)
    }

    fn reviews(&self, _id: &RegistrationId) -> Result<Vec<ReviewEntry>, RepositoryError> {
        Ok(Vec::new())
    }
}

pub(super) struct UnavailableRepository;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl RegistrationRepository for UnavailableRepository {
    fn insert(&self, _registration: NewRegistration) -> Result<Registration, RepositoryError> {
        offline()
    }

    fn fetch(&self, _id: &RegistrationId) -> Result<Option<Registration>, RepositoryError> {
        offline()
    }

    fn find_by_mobile(
        &self,
        _mobile_number: &MobileNumber,
    ) -> Result<Option<Registration>, RepositoryError> {
        offline()
    }

    fn find_by_customer_id(
        &self,
        _customer_id: &CustomerId,
    ) -> Result<Option<Registration>, RepositoryError> {
        offline()
    }

    fn select(&self, _filter: &RegistrationFilter) -> Result<Vec<Registration>, RepositoryError> {
        offline()
    }

    fn count(&self, _filter: &RegistrationFilter) -> Result<usize, RepositoryError> {
        offline()
    }

    fn update(
        &self,
        _id: &RegistrationId,
        _patch: RegistrationPatch,
    ) -> Result<Registration, RepositoryError> {
        offline()
    }

    fn apply_review(
        &self,
        _id: &RegistrationId,
        _patch: RegistrationPatch,
        _entry: ReviewEntry,
    ) -> Result<Registration, RepositoryError> {
        offline()
    }

    fn reviews(&self, _id: &RegistrationId) -> Result<Vec<ReviewEntry>, RepositoryError> {
        offline()
    }
}

/// Delegates to a real store but cannot write review transitions.
pub(super) struct ReviewWritesOffline {
    pub(super) inner: Arc<InMemoryStore>,
}

impl RegistrationRepository for ReviewWritesOffline {
    fn insert(&self, registration: NewRegistration) -> Result<Registration, RepositoryError> {
        self.inner.insert(registration)
    }

    fn fetch(&self, id: &RegistrationId) -> Result<Option<Registration>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn find_by_mobile(
        &self,
        mobile_number: &MobileNumber,
    ) -> Result<Option<Registration>, RepositoryError> {
        self.inner.find_by_mobile(mobile_number)
    }

    fn find_by_customer_id(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<Registration>, RepositoryError> {
        self.inner.find_by_customer_id(customer_id)
    }

    fn select(&self, filter: &RegistrationFilter) -> Result<Vec<Registration>, RepositoryError> {
        self.inner.select(filter)
    }

    fn count(&self, filter: &RegistrationFilter) -> Result<usize, RepositoryError> {
        RegistrationRepository::count(self.inner.as_ref(), filter)
    }

    fn update(
        &self,
        id: &RegistrationId,
        patch: RegistrationPatch,
    ) -> Result<Registration, RepositoryError> {
        RegistrationRepository::update(self.inner.as_ref(), id, patch)
    }

    fn apply_review(
        &self,
        _id: &RegistrationId,
        _patch: RegistrationPatch,
        _entry: ReviewEntry,
    ) -> Result<Registration, RepositoryError> {
        offline()
    }

    fn reviews(&self, id: &RegistrationId) -> Result<Vec<ReviewEntry>, RepositoryError> {
        self.inner.reviews(id)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
