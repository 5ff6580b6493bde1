//! Port for loading per-project configuration.

use std::collections::HashMap;

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{ProjectConfig, ProjectName};

define_port_error! {
    /// Failures raised while loading a project's configuration.
    pub enum ProjectConfigSourceError {
        /// No configuration exists for the project.
        Missing { project: String } => "project configuration not found: {project}",
        /// The configuration exists but could not be read.
        Unreadable { message: String } => "project configuration could not be read: {message}",
        /// The configuration was read but is invalid.
        Malformed { message: String } => "project configuration is malformed: {message}",
    }
}

/// Source of [`ProjectConfig`] values.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectConfigSource: Send + Sync {
    async fn load(&self, project: &ProjectName) -> Result<ProjectConfig, ProjectConfigSourceError>;
}

/// In-memory configuration source for tests and embedded deployments.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProjectConfigSource {
    configs: HashMap<ProjectName, ProjectConfig>,
}

impl InMemoryProjectConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(mut self, config: ProjectConfig) -> Self {
        self.configs.insert(config.project.clone(), config);
        self
    }
}

#[async_trait]
impl ProjectConfigSource for InMemoryProjectConfigSource {
    async fn load(&self, project: &ProjectName) -> Result<ProjectConfig, ProjectConfigSourceError> {
        self.configs
            .get(project)
            .cloned()
            .ok_or_else(|| ProjectConfigSourceError::missing(project.as_str()))
    }
}
