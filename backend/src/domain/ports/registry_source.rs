//! Port for loading a project's procedure registry.

use std::collections::HashMap;

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{ProcedureTable, ProjectName};

define_port_error! {
    /// Failures raised while loading a registry.
    pub enum RegistrySourceError {
        /// The project has no registry at all.
        Missing { project: String } => "procedure registry not found for project: {project}",
        /// The registry exists but could not be read.
        Unreadable { message: String } => "procedure registry could not be read: {message}",
        /// The registry was read but its contents are invalid.
        Malformed { message: String } => "procedure registry is malformed: {message}",
    }
}

/// Source of per-project procedure tables (file, remote service, fixture).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// Load the full procedure table for `project`.
    async fn load(&self, project: &ProjectName) -> Result<ProcedureTable, RegistrySourceError>;
}

/// In-memory registry source for tests and embedded deployments.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistrySource {
    tables: HashMap<ProjectName, ProcedureTable>,
}

impl InMemoryRegistrySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the procedure table for a project.
    pub fn with_project(mut self, project: ProjectName, table: ProcedureTable) -> Self {
        self.tables.insert(project, table);
        self
    }
}

#[async_trait]
impl RegistrySource for InMemoryRegistrySource {
    async fn load(&self, project: &ProjectName) -> Result<ProcedureTable, RegistrySourceError> {
        self.tables
            .get(project)
            .cloned()
            .ok_or_else(|| RegistrySourceError::missing(project.as_str()))
    }
}
