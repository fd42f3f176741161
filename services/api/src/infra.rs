use elife_registry::access::{AdminSession, FileSessionStore, SessionManager};
use elife_registry::catalog::{CatalogService, CategoryRepository, PanchayathRepository};
use elife_registry::config::{AppConfig, ExportConfig};
use elife_registry::dashboard::Dashboard;
use elife_registry::error::AppError;
use elife_registry::registrations::{RegistrationRepository, RegistrationService};
use elife_registry::store::FileStore;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Backing store able to serve every registry service.
pub(crate) trait Store:
    RegistrationRepository + CategoryRepository + PanchayathRepository + 'static
{
}

impl<T> Store for T where
    T: RegistrationRepository + CategoryRepository + PanchayathRepository + 'static
{
}

/// Services wired over one shared store.
pub(crate) struct Registry<S = FileStore> {
    pub(crate) registrations: Arc<RegistrationService<S>>,
    pub(crate) catalog: Arc<CatalogService<S, S>>,
    pub(crate) dashboard: Arc<Dashboard<S, S, S>>,
}

impl<S: Store> Registry<S> {
    pub(crate) fn new(store: S, export: ExportConfig) -> Self {
        let store = Arc::new(store);
        let registrations = Arc::new(RegistrationService::new(store.clone(), export));
        let catalog = Arc::new(CatalogService::new(store.clone(), store));
        let dashboard = Arc::new(Dashboard::new(registrations.clone(), catalog.clone()));
        Self {
            registrations,
            catalog,
            dashboard,
        }
    }
}

impl Registry<FileStore> {
    /// Registry over the snapshot at `path`. Every write goes straight to the file
    /// under its lock; a missing file starts an empty registry.
    pub(crate) fn open(path: &Path, export: ExportConfig) -> Result<Self, AppError> {
        let store = FileStore::new(path);
        store.verify()?;
        Ok(Self::new(store, export))
    }
}

/// Everything a one-shot CLI command needs: configuration, the persisted registry
/// and the persisted admin session acting as the caller.
pub(crate) struct Workspace {
    pub(crate) config: AppConfig,
    pub(crate) registry: Registry,
    pub(crate) session: SessionManager<FileSessionStore>,
}

impl Workspace {
    pub(crate) fn open() -> Result<Self, AppError> {
        let config = AppConfig::load()?;
        Self::with_config(config)
    }

    pub(crate) fn with_config(config: AppConfig) -> Result<Self, AppError> {
        let registry = Registry::open(&config.storage.data_path, config.export.clone())?;
        let session = SessionManager::open(FileSessionStore::new(&config.storage.session_path));
        Ok(Self {
            config,
            registry,
            session,
        })
    }

    pub(crate) fn actor(&self) -> Option<&AdminSession> {
        self.session.current()
    }
}
