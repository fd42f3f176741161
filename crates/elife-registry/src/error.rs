use crate::access::SessionError;
use crate::catalog::CatalogServiceError;
use crate::config::ConfigError;
use crate::dashboard::DashboardError;
use crate::registrations::{ExportError, RegistrationServiceError};
use crate::store::SnapshotError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Session(SessionError),
    Snapshot(SnapshotError),
    Export(ExportError),
    Registration(RegistrationServiceError),
    Catalog(CatalogServiceError),
    Dashboard(DashboardError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Session(err) => write!(f, "session error: {}", err),
            AppError::Snapshot(err) => write!(f, "store snapshot error: {}", err),
            AppError::Export(err) => write!(f, "export error: {}", err),
            AppError::Registration(err) => write!(f, "registration error: {}", err),
            AppError::Catalog(err) => write!(f, "catalog error: {}", err),
            AppError::Dashboard(err) => write!(f, "dashboard error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Session(err) => Some(err),
            AppError::Snapshot(err) => Some(err),
            AppError::Export(err) => Some(err),
            AppError::Registration(err) => Some(err),
            AppError::Catalog(err) => Some(err),
            AppError::Dashboard(err) => Some(err),
        }
    }
}

impl AppError {
    /// Denials keep their redirect semantics when surfaced through this type.
    fn access_denied(&self) -> Option<crate::access::AccessDenied> {
        match self {
            AppError::Registration(RegistrationServiceError::Unauthorized(denied))
            | AppError::Catalog(CatalogServiceError::Unauthorized(denied))
            | AppError::Dashboard(DashboardError::Unauthorized(denied)) => Some(*denied),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(denied) = self.access_denied() {
            return denied.into_response();
        }

        let status = match &self {
            AppError::Registration(RegistrationServiceError::Validation(_))
            | AppError::Catalog(CatalogServiceError::Validation(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Registration(RegistrationServiceError::Duplicate)
            | AppError::Registration(RegistrationServiceError::InvalidTransition(_))
            | AppError::Catalog(CatalogServiceError::DuplicateName(_)) => StatusCode::CONFLICT,
            AppError::Registration(RegistrationServiceError::NotFound)
            | AppError::Catalog(CatalogServiceError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Session(SessionError::Validation(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<SessionError> for AppError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}

impl From<SnapshotError> for AppError {
    fn from(value: SnapshotError) -> Self {
        Self::Snapshot(value)
    }
}

impl From<ExportError> for AppError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

impl From<RegistrationServiceError> for AppError {
    fn from(value: RegistrationServiceError) -> Self {
        Self::Registration(value)
    }
}

impl From<CatalogServiceError> for AppError {
    fn from(value: CatalogServiceError) -> Self {
        Self::Catalog(value)
    }
}

impl From<DashboardError> for AppError {
    fn from(value: DashboardError) -> Self {
        Self::Dashboard(value)
    }
}
