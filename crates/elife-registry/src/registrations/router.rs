use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{RegistrationId, RegistrationSubmission};
use super::lifecycle::ReviewAction;
use super::query::RegistrationFilter;
use super::repository::RegistrationRepository;
use super::service::{RegistrationService, RegistrationServiceError};
use crate::access::{AdminSession, CurrentAdmin};

/// Router exposing public intake and status checks plus the admin review surface.
pub fn registration_router<R>(service: Arc<RegistrationService<R>>) -> Router
where
    R: RegistrationRepository + 'static,
{
    Router::new()
        .route("/api/v1/registrations", post(submit_handler::<R>))
        .route(
            "/api/v1/registrations/status/:token",
            get(status_handler::<R>),
        )
        .route("/api/v1/admin/registrations", get(list_handler::<R>))
        .route(
            "/api/v1/admin/registrations/export",
            get(export_handler::<R>),
        )
        .route(
            "/api/v1/admin/registrations/:id/approve",
            post(approve_handler::<R>),
        )
        .route(
            "/api/v1/admin/registrations/:id/reject",
            post(reject_handler::<R>),
        )
        .route(
            "/api/v1/admin/registrations/:id/reopen",
            post(reopen_handler::<R>),
        )
        .route(
            "/api/v1/admin/registrations/:id/category",
            put(category_handler::<R>),
        )
        .route(
            "/api/v1/admin/registrations/:id/reviews",
            get(reviews_handler::<R>),
        )
        .with_state(service)
}

/// Query string filters; empty values mean "any".
#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    pub category: Option<String>,
    pub panchayath: Option<String>,
    pub status: Option<String>,
}

impl FilterParams {
    fn into_filter(self) -> Result<RegistrationFilter, RegistrationServiceError> {
        Ok(RegistrationFilter::from_params(
            self.category,
            self.panchayath,
            self.status,
        )?)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReasonRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryCorrection {
    pub category: String,
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<RegistrationService<R>>>,
    axum::Json(submission): axum::Json<RegistrationSubmission>,
) -> Response
where
    R: RegistrationRepository + 'static,
{
    match service.submit(submission) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R>(
    State(service): State<Arc<RegistrationService<R>>>,
    Path(token): Path<String>,
) -> Response
where
    R: RegistrationRepository + 'static,
{
    match service.check_status(&token) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(RegistrationServiceError::NotFound) => {
            let payload = json!({
                "error": "no registration found",
                "search": token.trim(),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<RegistrationService<R>>>,
    actor: CurrentAdmin,
    Query(params): Query<FilterParams>,
) -> Response
where
    R: RegistrationRepository + 'static,
{
    let listing = params.into_filter().and_then(|filter| {
        let snapshot = service.snapshot(actor.session())?;
        Ok((snapshot.filter(&filter), snapshot))
    });

    match listing {
        Ok((records, snapshot)) => {
            let payload = json!({
                "total": snapshot.len(),
                "filtered": records.len(),
                "records": records,
                "facets": snapshot.facets(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn export_handler<R>(
    State(service): State<Arc<RegistrationService<R>>>,
    actor: CurrentAdmin,
    Query(params): Query<FilterParams>,
) -> Response
where
    R: RegistrationRepository + 'static,
{
    let encoded = params
        .into_filter()
        .and_then(|filter| service.export(actor.session(), &filter))
        .and_then(|table| {
            let bytes = table.to_csv_bytes()?;
            Ok((table.file_name().to_string(), bytes))
        });

    match encoded {
        Ok((file_name, bytes)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{file_name}\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn approve_handler<R>(
    State(service): State<Arc<RegistrationService<R>>>,
    actor: CurrentAdmin,
    Path(id): Path<String>,
) -> Response
where
    R: RegistrationRepository + 'static,
{
    review(&service, actor.session(), id, ReviewAction::Approve, None)
}

pub(crate) async fn reject_handler<R>(
    State(service): State<Arc<RegistrationService<R>>>,
    actor: CurrentAdmin,
    Path(id): Path<String>,
    request: Option<axum::Json<ReasonRequest>>,
) -> Response
where
    R: RegistrationRepository + 'static,
{
    let reason = request.and_then(|axum::Json(request)| request.reason);
    review(&service, actor.session(), id, ReviewAction::Reject, reason)
}

pub(crate) async fn reopen_handler<R>(
    State(service): State<Arc<RegistrationService<R>>>,
    actor: CurrentAdmin,
    Path(id): Path<String>,
    request: Option<axum::Json<ReasonRequest>>,
) -> Response
where
    R: RegistrationRepository + 'static,
{
    let reason = request.and_then(|axum::Json(request)| request.reason);
    review(&service, actor.session(), id, ReviewAction::Reopen, reason)
}

fn review<R>(
    service: &RegistrationService<R>,
    actor: Option<&AdminSession>,
    id: String,
    action: ReviewAction,
    reason: Option<String>,
) -> Response
where
    R: RegistrationRepository + 'static,
{
    match service.review(actor, &RegistrationId(id), action, reason) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn category_handler<R>(
    State(service): State<Arc<RegistrationService<R>>>,
    actor: CurrentAdmin,
    Path(id): Path<String>,
    axum::Json(correction): axum::Json<CategoryCorrection>,
) -> Response
where
    R: RegistrationRepository + 'static,
{
    match service.correct_category(actor.session(), &RegistrationId(id), &correction.category) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reviews_handler<R>(
    State(service): State<Arc<RegistrationService<R>>>,
    actor: CurrentAdmin,
    Path(id): Path<String>,
) -> Response
where
    R: RegistrationRepository + 'static,
{
    match service.review_history(actor.session(), &RegistrationId(id)) {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn error_response(error: RegistrationServiceError) -> Response {
    let status = match &error {
        RegistrationServiceError::Unauthorized(denied) => return (*denied).into_response(),
        RegistrationServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RegistrationServiceError::Duplicate | RegistrationServiceError::InvalidTransition(_) => {
            StatusCode::CONFLICT
        }
        RegistrationServiceError::NotFound => StatusCode::NOT_FOUND,
        RegistrationServiceError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        RegistrationServiceError::Store(_) => {
            let payload = json!({
                "error": "registration store is unavailable, try again",
            });
            return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response();
        }
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
