//! Driven port for the remote function-call engine.

use async_trait::async_trait;
use serde_json::Value;

use super::define_port_error;
use crate::domain::ProcedureCall;

define_port_error! {
    /// Native remote failures, before mapping to the canonical taxonomy.
    pub enum RemoteEngineError {
        /// The request never produced an HTTP response.
        Transport { message: String } => "remote transport failed: {message}",
        /// The request exceeded its deadline.
        Timeout { message: String } => "remote call timed out: {message}",
        /// The engine answered with a non-success status.
        Status { status: u16, code: Option<String>, message: String } => "remote status {status}: {message}",
        /// The engine answered 2xx but the body could not be decoded.
        Decode { message: String } => "remote response could not be decoded: {message}",
        /// No remote engine is configured for this process.
        NotConfigured => "remote engine is not configured",
    }
}

impl RemoteEngineError {
    /// Whether the failure means the engine could not be used at all.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } | Self::NotConfigured => true,
            Self::Status { status, .. } => matches!(*status, 408 | 429 | 502..=504),
            Self::Decode { .. } => false,
        }
    }
}

/// Record-sets in an engine envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RemoteDataset {
    /// Unnamed record-sets, named `table1…` by the normaliser.
    Positional(Vec<Vec<Value>>),
    /// Record-sets with caller-chosen names, in reply order.
    Named(Vec<(String, Vec<Value>)>),
    #[default]
    Empty,
}

/// A function that already speaks the engine envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEnvelope {
    pub status_code: u16,
    pub message: Option<String>,
    pub dataset: RemoteDataset,
}

/// Decoded reply from the remote engine.
///
/// Adapters decide the shape once at the boundary; the normaliser never
/// inspects raw JSON to guess it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteReturn {
    Envelope(RemoteEnvelope),
    /// Any other value, wrapped as a single table.
    Raw(Value),
}

/// Remote function-call engine.
#[async_trait]
pub trait RemoteEngine: Send + Sync {
    /// `false` when no remote engine is configured; the dispatcher then never
    /// falls back to it.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Invoke `call` as a remote function.
    async fn call(&self, call: &ProcedureCall<'_>) -> Result<RemoteReturn, RemoteEngineError>;
}

/// Remote engine used when none is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledRemoteEngine;

#[async_trait]
impl RemoteEngine for DisabledRemoteEngine {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn call(&self, _call: &ProcedureCall<'_>) -> Result<RemoteReturn, RemoteEngineError> {
        Err(RemoteEngineError::not_configured())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RemoteEngineError::transport("dns"), true)]
    #[case(RemoteEngineError::timeout("10s"), true)]
    #[case(RemoteEngineError::not_configured(), true)]
    #[case(RemoteEngineError::status(429_u16, None::<String>, "slow down"), true)]
    #[case(RemoteEngineError::status(503_u16, None::<String>, "busy"), true)]
    #[case(RemoteEngineError::status(400_u16, Some("P0001".to_owned()), "rule"), false)]
    #[case(RemoteEngineError::decode("eof"), false)]
    fn availability_is_classified(#[case] error: RemoteEngineError, #[case] unavailable: bool) {
        assert_eq!(error.is_unavailable(), unavailable, "{error}");
    }
}
