//! Context resolution: which project, procedure, database and payload a
//! request means.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use super::call::NormalizedPayload;
use super::canonical::Engine;
use super::contract::EngineRequest;
use super::error::EngineError;
use super::names::{DatabaseName, NameValidationError, ProcedureName, ProjectName};
use super::ports::{Identity, ProjectConfigSource, RegistrySource};
use super::project::ProjectConfigStore;
use super::registry::{DatabaseScope, ProcedureRegistry};

/// Project and procedure named by a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallTarget {
    pub project: ProjectName,
    pub procedure: ProcedureName,
}

/// Everything the dispatcher needs for one call.
///
/// Created once per request and dropped once the response is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedExecutionContext {
    pub project: ProjectName,
    pub procedure: ProcedureName,
    pub scope: DatabaseScope,
    /// Physical database the relational engine targets.
    pub database: DatabaseName,
    pub payload: NormalizedPayload,
    /// Engine probed first while the project's mode is unknown.
    pub primary_engine: Engine,
    pub request_id: Option<String>,
}

/// Turns a request into a [`ResolvedExecutionContext`].
///
/// The project comes from the request or the configured default. The
/// registry gives the procedure's scope and the project config gives its
/// databases.
pub struct ContextResolver<S, C> {
    registry: Arc<ProcedureRegistry<S>>,
    configs: Arc<ProjectConfigStore<C>>,
    default_project: Option<ProjectName>,
}

impl<S, C> ContextResolver<S, C> {
    /// `default_project` applies to requests that name no project.
    pub fn new(
        registry: Arc<ProcedureRegistry<S>>,
        configs: Arc<ProjectConfigStore<C>>,
        default_project: Option<ProjectName>,
    ) -> Self {
        Self {
            registry,
            configs,
            default_project,
        }
    }

    /// Identify the project and procedure.
    ///
    /// The request's `project` wins over the process default; the procedure
    /// comes only from `action.procedure`.
    pub fn target(&self, request: &EngineRequest) -> Result<CallTarget, EngineError> {
        let requested = request
            .project
            .as_deref()
            .map(str::trim)
            .filter(|project| !project.is_empty());

        let project = match requested {
            Some(raw) => ProjectName::new(raw)
                .map_err(|err| EngineError::invalid_request(format!("project: {err}")))?,
            None => self.default_project.clone().ok_or_else(|| {
                EngineError::invalid_request("Project name missing in request and no default is set")
            })?,
        };

        let procedure = ProcedureName::new(request.procedure().unwrap_or_default()).map_err(
            |err| match err {
                NameValidationError::Empty { .. } => {
                    EngineError::invalid_request("action.procedure is required")
                }
                other => EngineError::invalid_request(format!("action.procedure: {other}")),
            },
        )?;

        Ok(CallTarget { project, procedure })
    }
}

/// Merge the structured and legacy payload shapes.
///
/// `action.params`/`action.form` win over `payload.params`/`payload.data`;
/// absent parts become empty objects.
pub fn normalize_payload(request: &EngineRequest) -> NormalizedPayload {
    let action = request.action.as_ref();
    let legacy = request.payload.as_ref();

    let pick = |structured: Option<&Map<String, Value>>, fallback: Option<&Map<String, Value>>| {
        structured.or(fallback).cloned().unwrap_or_default()
    };

    NormalizedPayload::new(
        pick(
            action.and_then(|a| a.params.as_ref()),
            legacy.and_then(|p| p.params.as_ref()),
        ),
        pick(
            action.and_then(|a| a.form.as_ref()),
            legacy.and_then(|p| p.data.as_ref()),
        ),
    )
}

impl<S: RegistrySource, C: ProjectConfigSource> ContextResolver<S, C> {
    /// Resolve a full execution context from a request.
    pub async fn resolve(
        &self,
        request: &EngineRequest,
        identity: Option<&Identity>,
    ) -> Result<ResolvedExecutionContext, EngineError> {
        let target = self.target(request)?;
        self.resolve_target(target, request, identity).await
    }

    /// Resolve the context for an already identified target.
    ///
    /// `MASTER` procedures always run on the project's master database, even
    /// when the caller names a tenant database. `TENANT` procedures use the
    /// identity's database, then the project default.
    pub async fn resolve_target(
        &self,
        target: CallTarget,
        request: &EngineRequest,
        identity: Option<&Identity>,
    ) -> Result<ResolvedExecutionContext, EngineError> {
        let CallTarget { project, procedure } = target;
        let scope = self.registry.resolve_scope(&project, &procedure).await?;
        let config = self.configs.get(&project).await?;

        let database = match scope {
            DatabaseScope::Master => config.master_database.clone(),
            DatabaseScope::Tenant => identity
                .and_then(|identity| identity.tenant_database.clone())
                .or_else(|| config.tenant_database_default.clone())
                .ok_or_else(|| EngineError::database_not_resolved(&project, &procedure))?,
        };

        debug!(
            project = %project,
            procedure = %procedure,
            scope = %scope,
            database = %database,
            "execution context resolved"
        );

        Ok(ResolvedExecutionContext {
            payload: normalize_payload(request),
            primary_engine: config.primary_engine,
            request_id: request.request_id().map(str::to_owned),
            project,
            procedure,
            scope,
            database,
        })
    }
}
