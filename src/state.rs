use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::application::{AuthService, ResourceCatalog, ResourceError};
use crate::config::{Config, StorageBackend};
use crate::infrastructure::accounts::DemoAuthenticator;
use crate::infrastructure::database::{RepositoryError, ResourceRepository, SqliteRepository};
use crate::infrastructure::memory::InMemoryRepository;
use crate::infrastructure::seed::seed_if_empty;
use crate::infrastructure::sessions::InMemorySessionStore;

/// Everything a request handler needs, shared across connections.
pub struct AppState {
    pub config: Config,
    catalog: Mutex<ResourceCatalog>,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(config: Config, catalog: ResourceCatalog, auth: AuthService) -> Arc<Self> {
        Arc::new(Self {
            config,
            catalog: Mutex::new(catalog),
            auth,
        })
    }

    /// Builds the configured repository, seeds it, and wires demo auth.
    pub fn from_config(config: Config) -> Result<Arc<Self>, RepositoryError> {
        let mut repository = open_repository(&config);
        if config.seed_demo_data {
            seed_if_empty(repository.as_mut())?;
        }
        info!(
            resources = repository.count()?,
            storage = ?config.storage,
            "Resource store ready"
        );

        let auth = AuthService::new(
            Box::new(DemoAuthenticator::new()),
            Box::new(InMemorySessionStore::new()),
        );

        Ok(Self::new(config, ResourceCatalog::new(repository), auth))
    }

    /// Runs `operation` with exclusive access to the catalog. Operations are
    /// serialized in arrival order.
    pub fn with_catalog<T>(
        &self,
        operation: impl FnOnce(&mut ResourceCatalog) -> Result<T, ResourceError>,
    ) -> Result<T, ResourceError> {
        let mut catalog = self
            .catalog
            .lock()
            .map_err(|_| ResourceError::Internal("catalog lock poisoned".to_string()))?;
        operation(&mut catalog)
    }
}

/// SQLite when configured and openable, otherwise the in-memory list.
fn open_repository(config: &Config) -> Box<dyn ResourceRepository> {
    match config.storage {
        StorageBackend::Memory => Box::new(InMemoryRepository::new()),
        StorageBackend::Sqlite => match SqliteRepository::new(&config.db_path) {
            Ok(repository) => Box::new(repository),
            Err(e) => {
                warn!(
                    "Failed to open {}: {}; falling back to in-memory storage",
                    config.db_path, e
                );
                Box::new(InMemoryRepository::new())
            }
        },
    }
}
