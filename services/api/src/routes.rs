use crate::infra::{AppState, Registry, Store};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use elife_registry::access::{session_router, with_admin_sessions, SessionTokens};
use elife_registry::catalog::catalog_router;
use elife_registry::dashboard::dashboard_router;
use elife_registry::registrations::registration_router;
use serde_json::json;
use std::sync::Arc;

/// Public, admin and operational routes over one registry. Admin routes act as
/// whoever the request's bearer token was issued to.
pub(crate) fn with_registry_routes<S: Store>(
    registry: &Registry<S>,
    sessions: Arc<SessionTokens>,
) -> axum::Router {
    let api = registration_router(registry.registrations.clone())
        .merge(catalog_router(registry.catalog.clone()))
        .merge(dashboard_router(registry.dashboard.clone()))
        .merge(session_router(sessions.clone()));

    with_admin_sessions(api, sessions)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
