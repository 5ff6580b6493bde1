//! Driven port for the relational engine (stored procedures over a pool).

use async_trait::async_trait;
use serde_json::Value;

use super::define_port_error;
use crate::domain::{DatabaseName, ProcedureCall};

define_port_error! {
    /// Native relational failures, before mapping to the canonical taxonomy.
    pub enum RelationalEngineError {
        /// The server could not be reached or refused the connection.
        Connect { message: String } => "relational connection failed: {message}",
        /// The pool or statement timed out.
        Timeout { message: String } => "relational call timed out: {message}",
        /// The server executed the call and reported an error.
        Database { code: Option<String>, message: String } => "relational error {code:?}: {message}",
        /// The server replied with something the adapter could not decode.
        Protocol { message: String } => "relational protocol error: {message}",
    }
}

/// SQLSTATE classes that describe an unreachable or saturated server rather
/// than a failing procedure.
const UNAVAILABLE_SQLSTATES: &[&str] = &["57P01", "53300"];

impl RelationalEngineError {
    /// Vendor error code, when the server supplied one.
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Self::Database { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Whether the failure means the engine could not be used at all.
    ///
    /// Only these failures let a steady-state call fall back to the other
    /// engine; anything else means the procedure ran and failed.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Connect { .. } | Self::Timeout { .. } => true,
            Self::Database { code: Some(code), .. } => {
                code.starts_with("08") || UNAVAILABLE_SQLSTATES.contains(&code.as_str())
            }
            Self::Database { code: None, .. } | Self::Protocol { .. } => false,
        }
    }
}

/// Record-sets returned by one procedure call, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSets(pub Vec<Vec<Value>>);

impl RecordSets {
    pub fn into_inner(self) -> Vec<Vec<Value>> {
        self.0
    }
}

/// Relational engine reachable through per-database pools.
///
/// `connect` is only called by the pool manager, once per database unless it
/// fails. `execute` borrows a pool and returns connections to it afterwards.
#[async_trait]
pub trait RelationalEngine: Send + Sync + 'static {
    type Pool: Clone + Send + Sync + 'static;

    /// Create a pool for `database`.
    async fn connect(&self, database: &DatabaseName) -> Result<Self::Pool, RelationalEngineError>;

    /// Run one procedure call on `pool`.
    async fn execute(
        &self,
        pool: &Self::Pool,
        call: &ProcedureCall<'_>,
    ) -> Result<RecordSets, RelationalEngineError>;

    /// Close a pool at shutdown.
    async fn close(&self, pool: Self::Pool) {
        drop(pool);
    }
}
