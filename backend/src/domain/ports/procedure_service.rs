//! Driving port for running procedures.
//!
//! Inbound adapters call this port with an already validated request and the
//! caller's identity. The service always answers with a rendered envelope;
//! failures are part of the envelope, never a transport error.

use async_trait::async_trait;

use super::Identity;
use crate::domain::{EngineRequest, EngineResponse};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcedureService: Send + Sync {
    /// Run the procedure named by `request`.
    async fn run(&self, request: EngineRequest, identity: Option<Identity>) -> EngineResponse;
}
