//! Per-project configuration and its process-lifetime store.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use super::canonical::Engine;
use super::error::EngineError;
use super::names::{DatabaseName, ProjectName};
use super::ports::{ProjectConfigSource, ProjectConfigSourceError};

/// Immutable configuration for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub project: ProjectName,
    /// Database serving `MASTER`-scoped procedures.
    pub master_database: DatabaseName,
    /// Tenant database used when the caller's identity supplies none.
    pub tenant_database_default: Option<DatabaseName>,
    /// Engine probed first on the project's first call.
    pub primary_engine: Engine,
}

impl ProjectConfig {
    /// Build a configuration with the default SQL-first policy.
    pub fn new(project: ProjectName, master_database: DatabaseName) -> Self {
        Self {
            project,
            master_database,
            tenant_database_default: None,
            primary_engine: Engine::Sql,
        }
    }

    /// Set the default tenant database.
    pub fn with_tenant_default(mut self, database: DatabaseName) -> Self {
        self.tenant_database_default = Some(database);
        self
    }

    /// Override the engine probed first.
    pub fn with_primary_engine(mut self, engine: Engine) -> Self {
        self.primary_engine = engine;
        self
    }
}

/// Memoised view over a [`ProjectConfigSource`].
///
/// The first successful load per project is kept for the life of the store;
/// failures are not cached.
pub struct ProjectConfigStore<C> {
    source: Arc<C>,
    loaded: DashMap<ProjectName, Arc<ProjectConfig>>,
}

impl<C> ProjectConfigStore<C> {
    pub fn new(source: Arc<C>) -> Self {
        Self {
            source,
            loaded: DashMap::new(),
        }
    }

    /// Number of projects currently cached.
    pub fn cached_projects(&self) -> usize {
        self.loaded.len()
    }
}

impl<C: ProjectConfigSource> ProjectConfigStore<C> {
    /// Return the configuration for `project`, loading it on first use.
    pub async fn get(&self, project: &ProjectName) -> Result<Arc<ProjectConfig>, EngineError> {
        if let Some(config) = self.loaded.get(project) {
            return Ok(Arc::clone(config.value()));
        }

        let config = self.source.load(project).await.map_err(|error| {
            warn!(project = %project, %error, "project configuration load failed");
            match error {
                ProjectConfigSourceError::Missing { .. } => EngineError::project_not_found(project),
                ProjectConfigSourceError::Unreadable { message }
                | ProjectConfigSourceError::Malformed { message } => {
                    EngineError::config_unavailable(project, message)
                }
            }
        })?;

        debug!(project = %project, master = %config.master_database, "project configuration loaded");
        let config = Arc::new(config);
        self.loaded.insert(project.clone(), Arc::clone(&config));
        Ok(config)
    }
}
