//! The procedure engine: guard, resolve, dispatch, render.
//!
//! One [`ProcedureEngine`] lives for the whole process. It owns the registry,
//! project configuration store, pool manager and mode cache so their state is
//! shared by every request.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{Instrument, debug, info_span};

use super::canonical::{CanonicalResult, Engine};
use super::contract::{EngineRequest, EngineResponse, ResponseMeta};
use super::dispatcher::HybridDispatcher;
use super::error::EngineError;
use super::error_mapper::{ErrorMapper, RuntimeMode};
use super::guard::AccessGuard;
use super::mode_cache::BackendModeCache;
use super::names::ProjectName;
use super::pool_manager::ConnectionPoolManager;
use super::ports::{
    Identity, ProcedureService, ProjectConfigSource, RegistrySource, RelationalEngine,
    RemoteEngine,
};
use super::project::ProjectConfigStore;
use super::registry::ProcedureRegistry;
use super::resolver::{CallTarget, ContextResolver};
use super::trace_id::TraceId;

/// Collaborators a [`ProcedureEngine`] is assembled from.
pub struct EngineComponents<R, M, S, C> {
    pub relational: Arc<R>,
    pub remote: Arc<M>,
    pub registry_source: Arc<S>,
    pub config_source: Arc<C>,
    /// Project used when a request names none.
    pub default_project: Option<ProjectName>,
    pub runtime_mode: RuntimeMode,
    pub clock: Arc<dyn Clock>,
}

/// The procedure execution pipeline.
///
/// Each call is guarded against the project registry, resolved to a database
/// and scope, then dispatched to the relational or remote engine. Every
/// outcome, including rejections, is normalized into an [`EngineResponse`].
/// The engine owns the connection pools and the per-project mode cache.
pub struct ProcedureEngine<R: RelationalEngine, M, S, C> {
    guard: AccessGuard<S>,
    resolver: ContextResolver<S, C>,
    dispatcher: HybridDispatcher<R, M>,
    pools: Arc<ConnectionPoolManager<R>>,
    modes: Arc<BackendModeCache>,
    runtime_mode: RuntimeMode,
    clock: Arc<dyn Clock>,
}

impl<R, M, S, C> ProcedureEngine<R, M, S, C>
where
    R: RelationalEngine,
    M: RemoteEngine,
    S: RegistrySource,
    C: ProjectConfigSource,
{
    /// Assemble the pipeline from its collaborators.
    ///
    /// Registry and config caches start empty and no pool is opened until
    /// the first call for a database.
    pub fn new(components: EngineComponents<R, M, S, C>) -> Self {
        let EngineComponents {
            relational,
            remote,
            registry_source,
            config_source,
            default_project,
            runtime_mode,
            clock,
        } = components;

        let registry = Arc::new(ProcedureRegistry::new(registry_source));
        let configs = Arc::new(ProjectConfigStore::new(config_source));
        let pools = Arc::new(ConnectionPoolManager::new(relational));
        let modes = Arc::new(BackendModeCache::new());

        Self {
            guard: AccessGuard::new(Arc::clone(&registry)),
            resolver: ContextResolver::new(registry, configs, default_project),
            dispatcher: HybridDispatcher::new(
                Arc::clone(&pools),
                remote,
                Arc::clone(&modes),
                ErrorMapper::new(runtime_mode),
            ),
            pools,
            modes,
            runtime_mode,
            clock,
        }
    }

    pub fn runtime_mode(&self) -> RuntimeMode {
        self.runtime_mode
    }

    /// Execute the request, returning the normalised result.
    ///
    /// The guard runs before anything touches a database: an unregistered
    /// procedure never acquires a pool.
    pub async fn execute(
        &self,
        request: &EngineRequest,
        identity: Option<&Identity>,
    ) -> Result<CanonicalResult, EngineError> {
        let target = self.resolver.target(request)?;
        self.guard.guard(&target.project, &target.procedure).await?;
        let ctx = self
            .resolver
            .resolve_target(target, request, identity)
            .await?;
        self.dispatcher.dispatch(&ctx).await
    }

    /// Execute the request and render the response envelope.
    pub async fn respond(
        &self,
        request: &EngineRequest,
        identity: Option<&Identity>,
    ) -> EngineResponse {
        let request_id = request
            .request_id()
            .map(str::to_owned)
            .or_else(|| TraceId::current().map(|id| id.to_string()));
        let meta = ResponseMeta::new(request_id, self.clock.utc().timestamp_millis());

        let span = info_span!(
            "procedure",
            project = request.project.as_deref().unwrap_or_default(),
            procedure = request.procedure().unwrap_or_default(),
        );
        match self.execute(request, identity).instrument(span).await {
            Ok(result) => EngineResponse::from_result(result, meta),
            Err(error) => {
                debug!(code = error.code(), status = error.status_code(), "call failed");
                let mut meta = meta;
                if let Ok(CallTarget { project, procedure }) = self.resolver.target(request) {
                    meta.project = Some(project.into());
                    meta.procedure = Some(procedure.into());
                }
                EngineResponse::failure(&error, meta, self.runtime_mode)
            }
        }
    }

    /// Engine recorded for `project`, if its mode is established.
    pub fn cached_mode(&self, project: &ProjectName) -> Option<Engine> {
        self.modes.get(project)
    }

    /// Number of live relational pools.
    pub fn pool_count(&self) -> usize {
        self.pools.pool_count()
    }

    /// Close every relational pool.
    pub async fn shutdown(&self) {
        self.pools.shutdown().await;
    }
}

#[async_trait]
impl<R, M, S, C> ProcedureService for ProcedureEngine<R, M, S, C>
where
    R: RelationalEngine,
    M: RemoteEngine,
    S: RegistrySource,
    C: ProjectConfigSource,
{
    async fn run(&self, request: EngineRequest, identity: Option<Identity>) -> EngineResponse {
        self.respond(&request, identity.as_ref()).await
    }
}
