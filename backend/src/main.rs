//! Engine entry-point: loads settings, assembles the engine and serves HTTP.

mod server;

use std::sync::Arc;

use actix_web::web;
use color_eyre::eyre::WrapErr;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use hybrid_engine::inbound::http::health::HealthState;
use hybrid_engine::settings::EngineSettings;
use server::{AppEngine, ServerConfig, build_engine, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = EngineSettings::load().wrap_err("failed to load engine settings")?;
    let engine = build_engine(&settings).wrap_err("failed to assemble procedure engine")?;
    let bind_addr = settings.bind_addr()?;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(
        health_state.clone(),
        ServerConfig::new(bind_addr, Arc::clone(&engine))
            .with_require_token(settings.require_token)
            .with_public_procedures(settings.public_procedures()),
    )?;
    info!(%bind_addr, "procedure engine listening");

    let handle = server.handle();
    actix_web::rt::spawn(drain_on_signal(health_state, handle));
    server.await?;

    close_pools(&engine).await;
    Ok(())
}

/// Mark the engine draining on Ctrl-C, then stop accepting connections.
async fn drain_on_signal(health_state: web::Data<HealthState>, handle: actix_web::dev::ServerHandle) {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "signal handler unavailable; relying on external stop");
        return;
    }
    info!("shutdown requested; draining");
    health_state.mark_draining();
    handle.stop(true).await;
}

async fn close_pools(engine: &AppEngine) {
    info!(pools = engine.pool_count(), "closing relational pools");
    engine.shutdown().await;
}
