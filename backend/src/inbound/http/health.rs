//! Readiness and liveness probes for orchestrators and load balancers.

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::http::header::CACHE_CONTROL;
use actix_web::{HttpResponse, get, web};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

const SERVICE_NAME: &str = "hybrid-engine";

/// Probe flags shared by the server and the probe handlers.
///
/// Starts not ready and alive. The server marks it ready once the engine is
/// assembled and draining once shutdown begins.
#[derive(Debug)]
pub struct HealthState {
    ready: AtomicBool,
    draining: AtomicBool,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(false),
            draining: AtomicBool::new(false),
        }
    }
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Fail both probes so traffic drains before pools close.
    pub fn mark_draining(&self) {
        self.draining.store(true, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire) && !self.is_draining()
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }
}

/// Probe body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProbeReport {
    #[schema(example = "ok")]
    pub status: &'static str,
    #[schema(example = "hybrid-engine")]
    pub engine: &'static str,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

fn probe_response(ok: bool) -> HttpResponse {
    let report = ProbeReport {
        status: if ok { "ok" } else { "unavailable" },
        engine: SERVICE_NAME,
        timestamp: Utc::now().timestamp_millis(),
    };
    let mut builder = if ok {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };
    builder.insert_header((CACHE_CONTROL, "no-store")).json(report)
}

/// Readiness probe: 200 once the engine is assembled, 503 before or while
/// draining.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    responses(
        (status = 200, description = "Ready for traffic", body = ProbeReport),
        (status = 503, description = "Starting or draining", body = ProbeReport)
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    probe_response(state.is_ready())
}

/// Liveness probe: 200 until shutdown begins.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    responses(
        (status = 200, description = "Process alive", body = ProbeReport),
        (status = 503, description = "Shutting down", body = ProbeReport)
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    probe_response(!state.is_draining())
}
