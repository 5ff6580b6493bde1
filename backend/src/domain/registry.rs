//! Procedure registry: which procedures a project exposes and where they run.
//!
//! Every invocable procedure has exactly one entry. An absent entry is a hard
//! rejection; there is no default scope.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::EngineError;
use super::names::{ProcedureName, ProjectName};
use super::ports::{RegistrySource, RegistrySourceError};

/// Database a procedure must run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DatabaseScope {
    /// The project's fixed master database.
    Master,
    /// The caller's tenant database.
    Tenant,
}

impl fmt::Display for DatabaseScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Master => "MASTER",
            Self::Tenant => "TENANT",
        })
    }
}

/// One registered procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureRegistryEntry {
    pub procedure_name: ProcedureName,
    pub scope: DatabaseScope,
}

/// All procedures registered for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcedureTable {
    entries: HashMap<ProcedureName, ProcedureRegistryEntry>,
}

impl ProcedureTable {
    /// Build a table; later duplicates replace earlier ones.
    pub fn from_entries(entries: impl IntoIterator<Item = ProcedureRegistryEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.procedure_name.clone(), entry))
                .collect(),
        }
    }

    /// Add one entry, builder style.
    pub fn with(mut self, procedure: ProcedureName, scope: DatabaseScope) -> Self {
        self.entries.insert(
            procedure.clone(),
            ProcedureRegistryEntry {
                procedure_name: procedure,
                scope,
            },
        );
        self
    }

    pub fn get(&self, procedure: &ProcedureName) -> Option<&ProcedureRegistryEntry> {
        self.entries.get(procedure)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Memoised, per-project view over a [`RegistrySource`].
pub struct ProcedureRegistry<S> {
    source: Arc<S>,
    tables: DashMap<ProjectName, Arc<ProcedureTable>>,
}

impl<S> ProcedureRegistry<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            tables: DashMap::new(),
        }
    }

    /// Number of projects whose registry is cached.
    pub fn cached_projects(&self) -> usize {
        self.tables.len()
    }
}

impl<S: RegistrySource> ProcedureRegistry<S> {
    /// Return the project's table, loading it on first use.
    ///
    /// Only successful loads are cached; a failed load is retried by the next
    /// call. Every load failure, an absent registry included, is
    /// `RegistryUnavailable`.
    pub async fn table(&self, project: &ProjectName) -> Result<Arc<ProcedureTable>, EngineError> {
        if let Some(table) = self.tables.get(project) {
            return Ok(Arc::clone(table.value()));
        }

        let table = self.source.load(project).await.map_err(|error| {
            warn!(project = %project, %error, "procedure registry load failed");
            let message = match error {
                RegistrySourceError::Missing { .. } => error.to_string(),
                RegistrySourceError::Unreadable { message }
                | RegistrySourceError::Malformed { message } => message,
            };
            EngineError::registry_unavailable(project, message)
        })?;

        debug!(project = %project, procedures = table.len(), "procedure registry loaded");
        let table = Arc::new(table);
        // A concurrent first load may have won; either copy is equivalent.
        let stored = self
            .tables
            .entry(project.clone())
            .or_insert_with(|| Arc::clone(&table));
        Ok(Arc::clone(stored.value()))
    }

    /// Scope required by `procedure` in `project`.
    pub async fn resolve_scope(
        &self,
        project: &ProjectName,
        procedure: &ProcedureName,
    ) -> Result<DatabaseScope, EngineError> {
        let table = self.table(project).await?;
        table
            .get(procedure)
            .map(|entry| entry.scope)
            .ok_or_else(|| EngineError::procedure_not_registered(project, procedure))
    }
}
