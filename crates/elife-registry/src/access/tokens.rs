use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::{self, Next},
    response::Response,
    Router,
};
use getrandom::fill;

use super::{AdminRole, AdminSession};
use crate::validation::{require_fields, ValidationError};

const TOKEN_BYTES: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to generate session token: {0}")]
    Entropy(String),
    #[error("session table is unavailable")]
    Unavailable,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Server-side admin sessions keyed by opaque bearer tokens.
///
/// A token is the only thing a client holds; the identity and role behind it
/// are fixed at login. Tokens stay valid until revoked.
#[derive(Default)]
pub struct SessionTokens {
    sessions: Mutex<HashMap<String, AdminSession>>,
}

impl SessionTokens {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> Result<MutexGuard<'_, HashMap<String, AdminSession>>, TokenError> {
        self.sessions.lock().map_err(|_| TokenError::Unavailable)
    }

    /// Starts a session and returns its token.
    pub fn login(&self, username: &str, role: AdminRole) -> Result<String, TokenError> {
        let username = username.trim();
        require_fields(&[("username", username)])?;

        let mut raw = [0u8; TOKEN_BYTES];
        fill(&mut raw).map_err(|err| TokenError::Entropy(err.to_string()))?;
        let token = hex::encode(raw);

        self.table()?
            .insert(token.clone(), AdminSession::new(username, role));
        tracing::info!(username = %username, role = %role, "admin session opened");
        Ok(token)
    }

    pub fn resolve(&self, token: &str) -> Option<AdminSession> {
        match self.table() {
            Ok(table) => table.get(token).cloned(),
            Err(err) => {
                tracing::error!(error = %err, "admin session lookup failed");
                None
            }
        }
    }

    /// Ends the session behind `token`. Unknown tokens are ignored.
    pub fn logout(&self, token: &str) -> Result<(), TokenError> {
        if let Some(previous) = self.table()?.remove(token) {
            tracing::info!(username = %previous.username, "admin session closed");
        }
        Ok(())
    }
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Attaches the session behind the request's bearer token, if any, as a
/// request extension for [`CurrentAdmin`].
pub async fn attach_admin(
    State(tokens): State<Arc<SessionTokens>>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = bearer_token(request.headers()).and_then(|token| tokens.resolve(token));
    if let Some(session) = session {
        request.extensions_mut().insert(session);
    }
    next.run(request).await
}

/// Wraps `router` so its handlers see the caller's session.
pub fn with_admin_sessions(router: Router, tokens: Arc<SessionTokens>) -> Router {
    router.layer(middleware::from_fn_with_state(tokens, attach_admin))
}

/// The acting admin, or `None` for anonymous callers and unknown tokens.
#[derive(Debug, Clone, Default)]
pub struct CurrentAdmin(pub Option<AdminSession>);

impl CurrentAdmin {
    pub fn session(&self) -> Option<&AdminSession> {
        self.0.as_ref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentAdmin
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<AdminSession>().cloned()))
    }
}
