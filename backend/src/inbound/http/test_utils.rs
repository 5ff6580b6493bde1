//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use serde_json::json;

use crate::domain::ports::{IdentityProvider, ProcedureService};
use crate::domain::{
    CanonicalResult, DatabaseName, Dataset, Engine, EngineResponse, ProcedureName, ProjectName,
    ResponseMeta, ResultMeta,
};
use crate::inbound::http::state::HttpState;

/// Wrap ports in handler state.
pub fn test_state(
    procedures: impl ProcedureService + 'static,
    identity: impl IdentityProvider + 'static,
) -> HttpState {
    HttpState::new(Arc::new(procedures), Arc::new(identity))
}

/// A successful `GetOrders` envelope served by the relational engine.
pub fn success_envelope() -> EngineResponse {
    let result = CanonicalResult {
        status_code: 200,
        success: true,
        message: "Success".to_owned(),
        dataset: Dataset::from_positional(vec![vec![json!({"id": 1})]]),
        meta: ResultMeta {
            project: ProjectName::new("ecom").expect("project"),
            backend: Engine::Sql,
            procedure: ProcedureName::new("GetOrders").expect("procedure"),
            database: Some(DatabaseName::new("ClientA_DB").expect("database")),
            duration_ms: 3,
        },
    };
    EngineResponse::from_result(result, ResponseMeta::new(Some("req-1".to_owned()), 0))
}
