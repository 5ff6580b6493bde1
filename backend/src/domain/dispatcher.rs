//! Hybrid dispatch between the relational and remote engines.
//!
//! Per project the dispatcher is in one of three states: `UNKNOWN` (no entry
//! in the [`BackendModeCache`]), `SQL` or `REMOTE`.
//!
//! - `UNKNOWN`: probe the project's primary engine; on any failure try the
//!   other. The engine that succeeds is recorded.
//! - `SQL`/`REMOTE`: call the recorded engine. Only an availability failure
//!   (unreachable server, pool exhaustion, timeout) triggers a one-off call to
//!   the other engine, and that call never changes the recorded mode. An
//!   execution failure is returned as is.
//!
//! When both engines fail the call ends with `BothBackendsFailed`, whose
//! primary cause is always the relational engine's error.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use super::call::ProcedureCall;
use super::canonical::{CanonicalError, CanonicalResult, Engine, ResultMeta};
use super::error::EngineError;
use super::error_mapper::ErrorMapper;
use super::mode_cache::BackendModeCache;
use super::normalizer::{normalize_relational, normalize_remote};
use super::pool_manager::ConnectionPoolManager;
use super::ports::{RelationalEngine, RemoteEngine};
use super::resolver::ResolvedExecutionContext;

/// A mapped engine failure plus whether the engine was reachable at all.
#[derive(Debug, Clone)]
struct EngineFailure {
    error: CanonicalError,
    unavailable: bool,
}

impl EngineFailure {
    /// Terminal error when no fallback is attempted.
    fn into_terminal(self) -> EngineError {
        if self.unavailable {
            EngineError::BackendUnavailable { error: self.error }
        } else {
            EngineError::execution(self.error)
        }
    }
}

fn both_failed(first: EngineFailure, second: EngineFailure) -> EngineError {
    let (primary, fallback) = match first.error.engine {
        Engine::Sql => (first.error, second.error),
        Engine::Remote => (second.error, first.error),
    };
    EngineError::BothBackendsFailed { primary, fallback }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Runs a resolved call on the relational or remote engine.
///
/// While a project's mode is unknown the dispatcher tries its primary engine,
/// then the other one if the first fails. The engine that answers is recorded
/// in the shared [`BackendModeCache`] and later calls go straight to it. Once
/// a mode is cached, only an availability failure falls back, and the cache
/// is left unchanged.
pub struct HybridDispatcher<R: RelationalEngine, M> {
    pools: Arc<ConnectionPoolManager<R>>,
    remote: Arc<M>,
    modes: Arc<BackendModeCache>,
    mapper: ErrorMapper,
}

impl<R: RelationalEngine, M: RemoteEngine> HybridDispatcher<R, M> {
    /// Build a dispatcher over shared pools and mode cache.
    ///
    /// `pools` and `modes` are the same instances the owning engine closes
    /// and inspects, so pass clones of its `Arc`s rather than fresh ones.
    pub fn new(
        pools: Arc<ConnectionPoolManager<R>>,
        remote: Arc<M>,
        modes: Arc<BackendModeCache>,
        mapper: ErrorMapper,
    ) -> Self {
        Self {
            pools,
            remote,
            modes,
            mapper,
        }
    }

    /// Backend mode recorded per project.
    pub fn modes(&self) -> &BackendModeCache {
        &self.modes
    }

    fn is_enabled(&self, engine: Engine) -> bool {
        match engine {
            Engine::Sql => true,
            Engine::Remote => self.remote.is_enabled(),
        }
    }

    /// Run the resolved call on the appropriate engine.
    pub async fn dispatch(
        &self,
        ctx: &ResolvedExecutionContext,
    ) -> Result<CanonicalResult, EngineError> {
        match self.modes.get(&ctx.project) {
            None => self.probe(ctx).await,
            Some(engine) => self.steady(ctx, engine).await,
        }
    }

    async fn probe(&self, ctx: &ResolvedExecutionContext) -> Result<CanonicalResult, EngineError> {
        let primary = if self.is_enabled(ctx.primary_engine) {
            ctx.primary_engine
        } else {
            ctx.primary_engine.other()
        };

        let first = match self.attempt(primary, ctx).await {
            Ok(result) => {
                self.record(ctx, primary);
                return Ok(result);
            }
            Err(failure) => failure,
        };

        let fallback = primary.other();
        if !self.is_enabled(fallback) {
            return Err(first.into_terminal());
        }
        warn!(
            project = %ctx.project,
            procedure = %ctx.procedure,
            failed = %primary,
            engine = %fallback,
            "probing fallback engine"
        );

        match self.attempt(fallback, ctx).await {
            Ok(result) => {
                self.record(ctx, fallback);
                Ok(result)
            }
            Err(second) => Err(both_failed(first, second)),
        }
    }

    async fn steady(
        &self,
        ctx: &ResolvedExecutionContext,
        cached: Engine,
    ) -> Result<CanonicalResult, EngineError> {
        let first = match self.attempt(cached, ctx).await {
            Ok(result) => return Ok(result),
            Err(failure) => failure,
        };

        let fallback = cached.other();
        if !first.unavailable || !self.is_enabled(fallback) {
            return Err(first.into_terminal());
        }
        warn!(
            project = %ctx.project,
            procedure = %ctx.procedure,
            failed = %cached,
            engine = %fallback,
            "cached engine unavailable; falling back for this call"
        );

        self.attempt(fallback, ctx)
            .await
            .map_err(|second| both_failed(first, second))
    }

    fn record(&self, ctx: &ResolvedExecutionContext, engine: Engine) {
        if self.modes.get(&ctx.project) != Some(engine) {
            info!(project = %ctx.project, engine = %engine, "backend mode established");
        }
        self.modes.record(&ctx.project, engine);
    }

    async fn attempt(
        &self,
        engine: Engine,
        ctx: &ResolvedExecutionContext,
    ) -> Result<CanonicalResult, EngineFailure> {
        let started = Instant::now();
        let call = ProcedureCall::new(&ctx.procedure, &ctx.payload);

        let outcome = match engine {
            Engine::Sql => self.run_relational(ctx, &call, started).await,
            Engine::Remote => self.run_remote(ctx, &call, started).await,
        };

        match &outcome {
            Ok(result) => info!(
                project = %ctx.project,
                procedure = %ctx.procedure,
                engine = %engine,
                database = %ctx.database,
                duration_ms = result.meta.duration_ms,
                request_id = ctx.request_id.as_deref().unwrap_or_default(),
                status_code = result.status_code,
                "procedure executed"
            ),
            Err(failure) => warn!(
                project = %ctx.project,
                procedure = %ctx.procedure,
                engine = %engine,
                duration_ms = elapsed_ms(started),
                request_id = ctx.request_id.as_deref().unwrap_or_default(),
                code = %failure.error.code,
                unavailable = failure.unavailable,
                "procedure failed"
            ),
        }
        outcome
    }

    fn meta(
        &self,
        ctx: &ResolvedExecutionContext,
        engine: Engine,
        started: Instant,
    ) -> ResultMeta {
        ResultMeta {
            project: ctx.project.clone(),
            backend: engine,
            procedure: ctx.procedure.clone(),
            database: matches!(engine, Engine::Sql).then(|| ctx.database.clone()),
            duration_ms: elapsed_ms(started),
        }
    }

    async fn run_relational(
        &self,
        ctx: &ResolvedExecutionContext,
        call: &ProcedureCall<'_>,
        started: Instant,
    ) -> Result<CanonicalResult, EngineFailure> {
        let pool = self.pools.acquire_pool(&ctx.database).await.map_err(|err| {
            error!(database = %err.database, error = %err.source, "relational engine unreachable");
            EngineFailure {
                error: self.mapper.map_sql(&err.source),
                unavailable: true,
            }
        })?;

        let sets = self
            .pools
            .engine()
            .execute(&pool, call)
            .await
            .map_err(|err| {
                error!(
                    database = %ctx.database,
                    procedure = %ctx.procedure,
                    sqlstate = err.sqlstate().unwrap_or_default(),
                    error = %err,
                    "relational execution error"
                );
                EngineFailure {
                    error: self.mapper.map_sql(&err),
                    unavailable: err.is_unavailable(),
                }
            })?;

        Ok(normalize_relational(sets, self.meta(ctx, Engine::Sql, started)))
    }

    async fn run_remote(
        &self,
        ctx: &ResolvedExecutionContext,
        call: &ProcedureCall<'_>,
        started: Instant,
    ) -> Result<CanonicalResult, EngineFailure> {
        let reply = self.remote.call(call).await.map_err(|err| {
            error!(procedure = %ctx.procedure, error = %err, "remote execution error");
            EngineFailure {
                error: self.mapper.map_remote(&err),
                unavailable: err.is_unavailable(),
            }
        })?;

        Ok(normalize_remote(reply, self.meta(ctx, Engine::Remote, started)))
    }
}
