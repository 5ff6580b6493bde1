//! Builders wiring configured adapters into the engine and HTTP state.

use std::sync::Arc;

use actix_web::web;
use async_trait::async_trait;
use mockable::DefaultClock;
use thiserror::Error;
use tracing::info;

use hybrid_engine::domain::ports::{
    RemoteEngine, RemoteEngineError, RemoteReturn, RequestClaimsIdentityProvider,
};
use hybrid_engine::domain::{EngineComponents, ProcedureCall, ProcedureEngine};
use hybrid_engine::inbound::http::state::HttpState;
use hybrid_engine::outbound::persistence::PgRelationalEngine;
use hybrid_engine::outbound::platform::{
    FileProjectConfigSource, FileRegistrySource, PlatformDir, PlatformDirError,
};
use hybrid_engine::outbound::remote::{SupabaseConfigError, SupabaseRpcEngine};
use hybrid_engine::settings::{EngineSettings, SettingsError};

/// Remote engine selected at startup.
pub enum ConfiguredRemote {
    Supabase(SupabaseRpcEngine),
    Disabled,
}

#[async_trait]
impl RemoteEngine for ConfiguredRemote {
    fn is_enabled(&self) -> bool {
        matches!(self, Self::Supabase(_))
    }

    async fn call(&self, call: &ProcedureCall<'_>) -> Result<RemoteReturn, RemoteEngineError> {
        match self {
            Self::Supabase(engine) => engine.call(call).await,
            Self::Disabled => Err(RemoteEngineError::not_configured()),
        }
    }
}

/// Engine type served by the binary.
pub type AppEngine = ProcedureEngine<
    PgRelationalEngine,
    ConfiguredRemote,
    FileRegistrySource,
    FileProjectConfigSource,
>;

/// Startup failures while assembling the engine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Platform(#[from] PlatformDirError),
    #[error(transparent)]
    Remote(#[from] SupabaseConfigError),
}

fn build_remote(settings: &EngineSettings) -> Result<ConfiguredRemote, BuildError> {
    match settings.remote()? {
        Some(remote) => {
            info!(url = %remote.url, "remote engine enabled");
            Ok(ConfiguredRemote::Supabase(SupabaseRpcEngine::new(
                remote.url,
                remote.key,
                remote.timeout,
            )?))
        }
        None => {
            info!("remote engine not configured; fallback disabled");
            Ok(ConfiguredRemote::Disabled)
        }
    }
}

/// Assemble the engine from settings.
pub fn build_engine(settings: &EngineSettings) -> Result<Arc<AppEngine>, BuildError> {
    let platform = PlatformDir::open(&settings.platform_dir())?;
    let runtime_mode = settings.runtime_mode()?;
    info!(
        platform_dir = %settings.platform_dir().display(),
        runtime_mode = %runtime_mode,
        "assembling procedure engine"
    );

    Ok(Arc::new(ProcedureEngine::new(EngineComponents {
        relational: Arc::new(PgRelationalEngine::new(settings.pool_config())),
        remote: Arc::new(build_remote(settings)?),
        registry_source: Arc::new(FileRegistrySource::new(platform.clone())),
        config_source: Arc::new(FileProjectConfigSource::new(platform)),
        default_project: settings.default_project()?,
        runtime_mode,
        clock: Arc::new(DefaultClock),
    })))
}

/// HTTP handler state backed by the engine.
pub(crate) fn build_http_state(
    engine: Arc<AppEngine>,
    require_token: bool,
    public_procedures: Vec<String>,
) -> web::Data<HttpState> {
    let identity =
        RequestClaimsIdentityProvider::new(require_token).with_public_procedures(public_procedures);
    web::Data::new(HttpState::new(engine, Arc::new(identity)))
}
