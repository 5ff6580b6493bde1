//! Domain model for the hybrid procedure engine.
//!
//! Purpose: turn a validated request into exactly one procedure call on the
//! relational or remote engine, and render the outcome as one canonical
//! envelope. Nothing in this module knows about HTTP, SQLx or reqwest; those
//! live behind the traits in [`ports`].
//!
//! Public surface:
//! - [`ProcedureEngine`]: guard, resolve, dispatch and render.
//! - [`EngineRequest`] / [`EngineResponse`]: the request and envelope contract.
//! - [`EngineError`]: every failure a call can end with.
//! - [`ErrorMapper`]: native engine errors to [`CanonicalError`].

pub mod call;
pub mod canonical;
pub mod contract;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod error_mapper;
pub mod guard;
pub mod mode_cache;
pub mod names;
pub mod normalizer;
pub mod pool_manager;
pub mod ports;
pub mod project;
pub mod registry;
pub mod resolver;
pub mod trace_id;

pub use self::call::{NormalizedPayload, ProcedureCall};
pub use self::canonical::{
    CanonicalError, CanonicalResult, Dataset, Engine, ErrorCategory, RecordSet, ResultMeta,
};
pub use self::contract::{
    EngineRequest, EngineResponse, LegacyPayload, RequestAction, RequestAuth, RequestMeta,
    ResponseData, ResponseError, ResponseMeta, ResponseStatus,
};
pub use self::dispatcher::HybridDispatcher;
pub use self::engine::{EngineComponents, ProcedureEngine};
pub use self::error::EngineError;
pub use self::error_mapper::{ErrorMapper, NativeError, ParseRuntimeModeError, RuntimeMode};
pub use self::guard::AccessGuard;
pub use self::mode_cache::BackendModeCache;
pub use self::names::{DatabaseName, NameValidationError, ProcedureName, ProjectName};
pub use self::pool_manager::{ConnectionPoolManager, PoolUnavailable};
pub use self::project::{ProjectConfig, ProjectConfigStore};
pub use self::registry::{DatabaseScope, ProcedureRegistry, ProcedureRegistryEntry, ProcedureTable};
pub use self::resolver::{CallTarget, ContextResolver, ResolvedExecutionContext};
pub use self::trace_id::TraceId;

/// Convenient engine result alias.
///
/// # Examples
/// ```
/// use hybrid_engine::domain::{EngineError, EngineResult};
///
/// fn reject() -> EngineResult<()> {
///     Err(EngineError::invalid_request("action.procedure is required"))
/// }
/// # assert!(reject().is_err());
/// ```
pub type EngineResult<T> = Result<T, EngineError>;
