//! Read-time counts shown on the super admin dashboard.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::json;

use crate::access::{authorize, AccessDenied, AdminRole, AdminSession, CurrentAdmin};
use crate::catalog::{CatalogService, CatalogServiceError, CategoryRepository, PanchayathRepository};
use crate::registrations::{RegistrationRepository, RegistrationService, RegistrationServiceError};

pub const DASHBOARD_ROLE: AdminRole = AdminRole::SuperAdmin;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub categories: usize,
    pub panchayaths: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error(transparent)]
    Unauthorized(#[from] AccessDenied),
    #[error(transparent)]
    Registrations(#[from] RegistrationServiceError),
    #[error(transparent)]
    Catalog(#[from] CatalogServiceError),
}

pub struct Dashboard<R, C, P> {
    registrations: Arc<RegistrationService<R>>,
    catalog: Arc<CatalogService<C, P>>,
}

impl<R, C, P> Dashboard<R, C, P>
where
    R: RegistrationRepository + 'static,
    C: CategoryRepository + 'static,
    P: PanchayathRepository + 'static,
{
    pub fn new(
        registrations: Arc<RegistrationService<R>>,
        catalog: Arc<CatalogService<C, P>>,
    ) -> Self {
        Self {
            registrations,
            catalog,
        }
    }

    /// Counts straight from the store; nothing is cached between reads.
    pub fn stats(&self, actor: Option<&AdminSession>) -> Result<DashboardStats, DashboardError> {
        authorize(actor, DASHBOARD_ROLE)?;
        let registrations = self.registrations.stats()?;
        Ok(DashboardStats {
            total: registrations.total,
            pending: registrations.pending,
            approved: registrations.approved,
            rejected: registrations.rejected,
            categories: self.catalog.category_count()?,
            panchayaths: self.catalog.panchayath_count()?,
        })
    }
}

pub fn dashboard_router<R, C, P>(dashboard: Arc<Dashboard<R, C, P>>) -> Router
where
    R: RegistrationRepository + 'static,
    C: CategoryRepository + 'static,
    P: PanchayathRepository + 'static,
{
    Router::new()
        .route("/api/v1/admin/dashboard", get(stats_handler::<R, C, P>))
        .with_state(dashboard)
}

pub(crate) async fn stats_handler<R, C, P>(
    State(dashboard): State<Arc<Dashboard<R, C, P>>>,
    actor: CurrentAdmin,
) -> Response
where
    R: RegistrationRepository + 'static,
    C: CategoryRepository + 'static,
    P: PanchayathRepository + 'static,
{
    match dashboard.stats(actor.session()) {
        Ok(stats) => (StatusCode::OK, axum::Json(stats)).into_response(),
        Err(DashboardError::Unauthorized(denied)) => denied.into_response(),
        Err(_) => {
            let payload = json!({
                "error": "dashboard is unavailable, try again",
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
