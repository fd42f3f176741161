use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{AdminRole, AdminSession};
use crate::validation::{require_fields, ValidationError};

/// Persistence for the single admin credential record.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<AdminSession>, SessionError>;
    fn save(&self, session: &AdminSession) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session record at {path} unavailable: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session record at {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Serialize, Deserialize)]
struct SessionRecord {
    #[serde(rename = "adminAuth")]
    admin_auth: AdminSession,
}

/// Stores the session as `{"adminAuth": {...}}` in one JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<AdminSession>, SessionError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };

        let record: SessionRecord =
            serde_json::from_slice(&bytes).map_err(|source| SessionError::Malformed {
                path: self.path.clone(),
                source,
            })?;
        Ok(Some(record.admin_auth))
    }

    fn save(&self, session: &AdminSession) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }

        let record = SessionRecord {
            admin_auth: session.clone(),
        };
        let payload =
            serde_json::to_vec_pretty(&record).map_err(|source| SessionError::Malformed {
                path: self.path.clone(),
                source,
            })?;
        fs::write(&self.path, payload).map_err(|err| self.io_error(err))
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.io_error(err)),
        }
    }
}

/// Holds the current admin session, read once from the store when opened.
///
/// `login` and `logout` are the only mutators and both are idempotent. Sessions
/// never expire on their own.
pub struct SessionManager<S> {
    store: S,
    current: Option<AdminSession>,
}

impl<S: SessionStore> SessionManager<S> {
    pub fn open(store: S) -> Self {
        let current = match store.load() {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unreadable admin session record");
                None
            }
        };
        Self { store, current }
    }

    pub fn current(&self) -> Option<&AdminSession> {
        self.current.as_ref()
    }

    pub fn login(&mut self, username: &str, role: AdminRole) -> Result<&AdminSession, SessionError> {
        let username = username.trim();
        require_fields(&[("username", username)])?;

        let session = AdminSession::new(username, role);
        self.store.save(&session)?;
        tracing::info!(username = %session.username, role = %session.role, "admin logged in");
        let stored: &AdminSession = self.current.insert(session);
        Ok(stored)
    }

    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.store.clear()?;
        if let Some(previous) = self.current.take() {
            tracing::info!(username = %previous.username, "admin logged out");
        }
        Ok(())
    }
}
