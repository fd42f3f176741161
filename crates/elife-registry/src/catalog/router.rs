use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde_json::json;

use super::domain::{
    Category, CategoryDraft, CategoryId, CategoryListing, PanchayathDraft, PanchayathId,
};
use super::repository::{CategoryRepository, PanchayathRepository};
use super::service::{CatalogService, CatalogServiceError};
use crate::access::CurrentAdmin;

type SharedCatalog<C, P> = Arc<CatalogService<C, P>>;

/// Public reference lists plus the admin catalog editor.
pub fn catalog_router<C, P>(service: SharedCatalog<C, P>) -> Router
where
    C: CategoryRepository + 'static,
    P: PanchayathRepository + 'static,
{
    Router::new()
        .route("/api/v1/categories", get(active_categories_handler::<C, P>))
        .route("/api/v1/panchayaths", get(panchayaths_handler::<C, P>))
        .route(
            "/api/v1/admin/categories",
            get(all_categories_handler::<C, P>).post(create_category_handler::<C, P>),
        )
        .route(
            "/api/v1/admin/categories/:id",
            put(update_category_handler::<C, P>),
        )
        .route(
            "/api/v1/admin/categories/:id/toggle",
            post(toggle_category_handler::<C, P>),
        )
        .route(
            "/api/v1/admin/panchayaths",
            post(create_panchayath_handler::<C, P>),
        )
        .route(
            "/api/v1/admin/panchayaths/:id",
            put(update_panchayath_handler::<C, P>).delete(delete_panchayath_handler::<C, P>),
        )
        .with_state(service)
}

fn respond<T: serde::Serialize>(status: StatusCode, outcome: Result<T, CatalogServiceError>) -> Response {
    match outcome {
        Ok(body) => (status, axum::Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

fn listings(categories: Vec<Category>) -> Vec<CategoryListing> {
    categories.into_iter().map(CategoryListing::from).collect()
}

pub(crate) async fn active_categories_handler<C, P>(
    State(service): State<SharedCatalog<C, P>>,
) -> Response
where
    C: CategoryRepository + 'static,
    P: PanchayathRepository + 'static,
{
    respond(StatusCode::OK, service.active_categories().map(listings))
}

pub(crate) async fn panchayaths_handler<C, P>(
    State(service): State<SharedCatalog<C, P>>,
) -> Response
where
    C: CategoryRepository + 'static,
    P: PanchayathRepository + 'static,
{
    respond(StatusCode::OK, service.panchayaths())
}

pub(crate) async fn all_categories_handler<C, P>(
    State(service): State<SharedCatalog<C, P>>,
    actor: CurrentAdmin,
) -> Response
where
    C: CategoryRepository + 'static,
    P: PanchayathRepository + 'static,
{
    respond(StatusCode::OK, service.all_categories(actor.session()).map(listings))
}

pub(crate) async fn create_category_handler<C, P>(
    State(service): State<SharedCatalog<C, P>>,
    actor: CurrentAdmin,
    axum::Json(draft): axum::Json<CategoryDraft>,
) -> Response
where
    C: CategoryRepository + 'static,
    P: PanchayathRepository + 'static,
{
    respond(StatusCode::CREATED, service.create_category(actor.session(), draft))
}

pub(crate) async fn update_category_handler<C, P>(
    State(service): State<SharedCatalog<C, P>>,
    actor: CurrentAdmin,
    Path(id): Path<String>,
    axum::Json(draft): axum::Json<CategoryDraft>,
) -> Response
where
    C: CategoryRepository + 'static,
    P: PanchayathRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.update_category(actor.session(), &CategoryId(id), draft),
    )
}

pub(crate) async fn toggle_category_handler<C, P>(
    State(service): State<SharedCatalog<C, P>>,
    actor: CurrentAdmin,
    Path(id): Path<String>,
) -> Response
where
    C: CategoryRepository + 'static,
    P: PanchayathRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.toggle_category(actor.session(), &CategoryId(id)),
    )
}

pub(crate) async fn create_panchayath_handler<C, P>(
    State(service): State<SharedCatalog<C, P>>,
    actor: CurrentAdmin,
    axum::Json(draft): axum::Json<PanchayathDraft>,
) -> Response
where
    C: CategoryRepository + 'static,
    P: PanchayathRepository + 'static,
{
    respond(
        StatusCode::CREATED,
        service.create_panchayath(actor.session(), draft),
    )
}

pub(crate) async fn update_panchayath_handler<C, P>(
    State(service): State<SharedCatalog<C, P>>,
    actor: CurrentAdmin,
    Path(id): Path<String>,
    axum::Json(draft): axum::Json<PanchayathDraft>,
) -> Response
where
    C: CategoryRepository + 'static,
    P: PanchayathRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.update_panchayath(actor.session(), &PanchayathId(id), draft),
    )
}

pub(crate) async fn delete_panchayath_handler<C, P>(
    State(service): State<SharedCatalog<C, P>>,
    actor: CurrentAdmin,
    Path(id): Path<String>,
) -> Response
where
    C: CategoryRepository + 'static,
    P: PanchayathRepository + 'static,
{
    match service.delete_panchayath(actor.session(), &PanchayathId(id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn error_response(error: CatalogServiceError) -> Response {
    let status = match &error {
        CatalogServiceError::Unauthorized(denied) => return (*denied).into_response(),
        CatalogServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CatalogServiceError::DuplicateName(_) => StatusCode::CONFLICT,
        CatalogServiceError::NotFound => StatusCode::NOT_FOUND,
        CatalogServiceError::Store(_) => {
            let payload = json!({
                "error": "catalog store is unavailable, try again",
            });
            return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response();
        }
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
