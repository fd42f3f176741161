use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::tokens::{bearer_token, SessionTokens, TokenError};
use super::{AccessDenied, AdminRole};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub role: AdminRole,
}

/// Admin login, logout and the current-session lookup.
pub fn session_router(tokens: Arc<SessionTokens>) -> Router {
    Router::new()
        .route("/api/v1/admin/login", post(login_handler))
        .route("/api/v1/admin/logout", post(logout_handler))
        .route("/api/v1/admin/session", get(session_handler))
        .with_state(tokens)
}

pub(crate) async fn login_handler(
    State(tokens): State<Arc<SessionTokens>>,
    axum::Json(request): axum::Json<LoginRequest>,
) -> Response {
    match tokens.login(&request.username, request.role) {
        Ok(token) => {
            let payload = json!({
                "token": token,
                "username": request.username.trim(),
                "role": request.role,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn logout_handler(
    State(tokens): State<Arc<SessionTokens>>,
    headers: HeaderMap,
) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return StatusCode::NO_CONTENT.into_response();
    };
    match tokens.logout(token) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn session_handler(
    State(tokens): State<Arc<SessionTokens>>,
    headers: HeaderMap,
) -> Response {
    match bearer_token(&headers).and_then(|token| tokens.resolve(token)) {
        Some(session) => (StatusCode::OK, axum::Json(session)).into_response(),
        None => AccessDenied::Unauthenticated.into_response(),
    }
}

fn error_response(error: TokenError) -> Response {
    let status = match &error {
        TokenError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        TokenError::Entropy(_) | TokenError::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
