//! Role hierarchy, the authorization gate, and the admin session lifecycle.
//!
//! Every mutating operation takes the acting [`AdminSession`] explicitly; nothing in
//! this crate reads an ambient "current user". Over HTTP the session comes from a
//! server-issued bearer token, never from anything the caller asserts directly.

mod role;
pub mod router;
pub mod session;
pub mod tokens;

use axum::response::{IntoResponse, Redirect, Response};
use serde::{Deserialize, Serialize};

pub use role::{check_access, AdminRole, UnknownRole};
pub use router::session_router;
pub use session::{FileSessionStore, SessionError, SessionManager, SessionStore};
pub use tokens::{bearer_token, with_admin_sessions, CurrentAdmin, SessionTokens, TokenError};

pub const LOGIN_PATH: &str = "/admin/login";
pub const DASHBOARD_PATH: &str = "/admin/dashboard";

/// Identity of the administrator performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
    pub username: String,
    pub role: AdminRole,
}

impl AdminSession {
    pub fn new(username: impl Into<String>, role: AdminRole) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }
}

/// Authorization failure. Both variants render the same message so callers never
/// learn which privilege was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("insufficient role")]
    Unauthenticated,
    #[error("insufficient role")]
    InsufficientRole,
}

impl AccessDenied {
    /// Where a browser should be sent instead of seeing the failure.
    pub const fn redirect_target(self) -> &'static str {
        match self {
            AccessDenied::Unauthenticated => LOGIN_PATH,
            AccessDenied::InsufficientRole => DASHBOARD_PATH,
        }
    }
}

impl IntoResponse for AccessDenied {
    fn into_response(self) -> Response {
        Redirect::to(self.redirect_target()).into_response()
    }
}

/// Gate a mutation: returns the actor when its role ranks at least `required`.
pub fn authorize(
    actor: Option<&AdminSession>,
    required: AdminRole,
) -> Result<&AdminSession, AccessDenied> {
    match actor {
        None => {
            tracing::warn!(required = %required, "unauthenticated admin operation rejected");
            Err(AccessDenied::Unauthenticated)
        }
        Some(session) if check_access(Some(session.role), required) => Ok(session),
        Some(session) => {
            tracing::warn!(
                username = %session.username,
                role = %session.role,
                required = %required,
                "admin operation rejected"
            );
            Err(AccessDenied::InsufficientRole)
        }
    }
}
