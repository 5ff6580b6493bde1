//! Canonical call payload handed to backend engines.

use serde_json::{Map, Value};

use super::names::ProcedureName;

/// Canonical `{params, data}` payload.
///
/// `params` carries filter/lookup arguments; `data` carries form fields for
/// mutations. Both default to empty objects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedPayload {
    pub params: Map<String, Value>,
    pub data: Map<String, Value>,
}

impl NormalizedPayload {
    pub fn new(params: Map<String, Value>, data: Map<String, Value>) -> Self {
        Self { params, data }
    }
}

/// A single procedure invocation as seen by an engine adapter.
///
/// Adapters serialise the payload into their native argument shape.
#[derive(Debug, Clone, Copy)]
pub struct ProcedureCall<'a> {
    pub procedure: &'a ProcedureName,
    pub payload: &'a NormalizedPayload,
}

impl<'a> ProcedureCall<'a> {
    pub fn new(procedure: &'a ProcedureName, payload: &'a NormalizedPayload) -> Self {
        Self { procedure, payload }
    }

    pub fn params(&self) -> &'a Map<String, Value> {
        &self.payload.params
    }

    pub fn data(&self) -> &'a Map<String, Value> {
        &self.payload.data
    }
}
