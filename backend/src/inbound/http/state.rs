//! Shared HTTP adapter state.
//!
//! Handlers receive this through `actix_web::web::Data` and only see domain
//! ports, so they stay testable without databases or network access.

use std::sync::Arc;

use crate::domain::ports::{IdentityProvider, ProcedureService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub procedures: Arc<dyn ProcedureService>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl HttpState {
    pub fn new(procedures: Arc<dyn ProcedureService>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            procedures,
            identity,
        }
    }
}
