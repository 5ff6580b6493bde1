//! Access guard: the single checkpoint between callers and the engines.
//!
//! Runs strictly before any pool is acquired or payload leaves the process.

use std::sync::Arc;

use tracing::warn;

use super::error::EngineError;
use super::names::{ProcedureName, ProjectName};
use super::ports::RegistrySource;
use super::registry::{DatabaseScope, ProcedureRegistry};

/// Rejects procedures missing from the project's registry.
pub struct AccessGuard<S> {
    registry: Arc<ProcedureRegistry<S>>,
}

impl<S> AccessGuard<S> {
    pub fn new(registry: Arc<ProcedureRegistry<S>>) -> Self {
        Self { registry }
    }
}

impl<S: RegistrySource> AccessGuard<S> {
    /// Admit `procedure` for `project`, returning its registered scope.
    ///
    /// A registry that cannot be loaded surfaces as `RegistryUnavailable`;
    /// only a genuinely unknown procedure is `ProcedureNotAllowed`.
    pub async fn guard(
        &self,
        project: &ProjectName,
        procedure: &ProcedureName,
    ) -> Result<DatabaseScope, EngineError> {
        match self.registry.resolve_scope(project, procedure).await {
            Ok(scope) => Ok(scope),
            Err(EngineError::ProcedureNotRegistered { .. }) => {
                warn!(project = %project, procedure = %procedure, "procedure rejected by guard");
                Err(EngineError::procedure_not_allowed(project, procedure))
            }
            Err(other) => Err(other),
        }
    }
}
