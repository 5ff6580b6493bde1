//! HTTP server configuration object.

use std::net::SocketAddr;
use std::sync::Arc;

use hybrid_engine::domain::ports::DEFAULT_PUBLIC_PROCEDURES;

use super::state_builders::AppEngine;

/// Everything the HTTP server needs once the engine is assembled.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) engine: Arc<AppEngine>,
    pub(crate) require_token: bool,
    pub(crate) public_procedures: Vec<String>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(bind_addr: SocketAddr, engine: Arc<AppEngine>) -> Self {
        Self {
            bind_addr,
            engine,
            require_token: false,
            public_procedures: DEFAULT_PUBLIC_PROCEDURES
                .iter()
                .map(|name| (*name).to_owned())
                .collect(),
        }
    }

    /// Reject requests without a caller token.
    #[must_use]
    pub fn with_require_token(mut self, require_token: bool) -> Self {
        self.require_token = require_token;
        self
    }

    /// Procedures that stay callable without a token.
    #[must_use]
    pub fn with_public_procedures(mut self, procedures: Vec<String>) -> Self {
        self.public_procedures = procedures;
        self
    }
}
