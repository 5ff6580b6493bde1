//! Shared harness for behavioural tests.
//!
//! Builds an engine over scripted backends and in-memory registry/config
//! sources for the `ecom` project:
//!
//! - `GetOrders` is `TENANT`-scoped
//! - `AdminLoginProc` is `MASTER`-scoped
//! - the master database is `EcomSetup`

use std::sync::Arc;

use hybrid_engine::domain::ports::{
    Identity, IdentityProvider, InMemoryProjectConfigSource, InMemoryRegistrySource,
    RequestClaimsIdentityProvider,
};
use hybrid_engine::domain::{
    DatabaseName, DatabaseScope, Engine, EngineComponents, EngineRequest, EngineResponse,
    ProcedureEngine, ProcedureName, ProcedureTable, ProjectConfig, ProjectName, RuntimeMode,
};
use hybrid_engine::test_support::{FixedClock, ScriptedRelationalEngine, ScriptedRemoteEngine};
use serde_json::Value;

pub type ScriptedEngine = ProcedureEngine<
    ScriptedRelationalEngine,
    ScriptedRemoteEngine,
    InMemoryRegistrySource,
    InMemoryProjectConfigSource,
>;

pub const MASTER_DB: &str = "EcomSetup";

pub fn ecom() -> ProjectName {
    ProjectName::new("ecom").expect("project name")
}

pub fn procedures() -> ProcedureTable {
    ProcedureTable::default()
        .with(
            ProcedureName::new("GetOrders").expect("procedure"),
            DatabaseScope::Tenant,
        )
        .with(
            ProcedureName::new("AdminLoginProc").expect("procedure"),
            DatabaseScope::Master,
        )
}

/// Engine plus handles on its scripted backends.
pub struct Harness {
    pub engine: Arc<ScriptedEngine>,
    pub relational: Arc<ScriptedRelationalEngine>,
    pub remote: Arc<ScriptedRemoteEngine>,
}

impl Harness {
    pub fn new(relational: ScriptedRelationalEngine, remote: ScriptedRemoteEngine) -> Self {
        Self::with_primary(relational, remote, Engine::Sql)
    }

    pub fn with_primary(
        relational: ScriptedRelationalEngine,
        remote: ScriptedRemoteEngine,
        primary_engine: Engine,
    ) -> Self {
        let relational = Arc::new(relational);
        let remote = Arc::new(remote);
        let config = ProjectConfig::new(ecom(), DatabaseName::new(MASTER_DB).expect("database"))
            .with_primary_engine(primary_engine);

        let engine = ProcedureEngine::new(EngineComponents {
            relational: Arc::clone(&relational),
            remote: Arc::clone(&remote),
            registry_source: Arc::new(
                InMemoryRegistrySource::new().with_project(ecom(), procedures()),
            ),
            config_source: Arc::new(InMemoryProjectConfigSource::new().with_project(config)),
            default_project: Some(ecom()),
            runtime_mode: RuntimeMode::Production,
            clock: Arc::new(FixedClock::new_year()),
        });

        Self {
            engine: Arc::new(engine),
            relational,
            remote,
        }
    }

    /// Identify the caller from the request claims and run the call.
    pub async fn run(&self, request: &EngineRequest) -> EngineResponse {
        let identity = identify(request).await;
        self.engine.respond(request, identity.as_ref()).await
    }

    /// Database of the most recent relational execution.
    pub fn last_database(&self) -> Option<String> {
        self.relational
            .calls()
            .last()
            .and_then(|call| call.database.as_ref().map(|db| db.as_str().to_owned()))
    }
}

pub async fn identify(request: &EngineRequest) -> Option<Identity> {
    RequestClaimsIdentityProvider::new(false)
        .identify(request)
        .await
        .expect("claims identity")
}

pub fn request(body: Value) -> EngineRequest {
    serde_json::from_value(body).expect("request envelope")
}

/// `{action:{procedure, params:{id:1}}, auth:{companyDb}}` for `ecom`.
pub fn call(procedure: &str, company_db: &str) -> EngineRequest {
    request(serde_json::json!({
        "project": "ecom",
        "action": {"procedure": procedure, "params": {"id": 1}},
        "auth": {"companyDb": company_db}
    }))
}

pub fn healthy_sql() -> ScriptedRelationalEngine {
    ScriptedRelationalEngine::healthy(vec![vec![
        serde_json::json!({"StatusCode": 200, "Message": "Success", "id": 1}),
    ]])
}

pub fn healthy_remote() -> ScriptedRemoteEngine {
    ScriptedRemoteEngine::healthy(hybrid_engine::domain::ports::RemoteReturn::Raw(
        serde_json::json!([{"id": 1}]),
    ))
}
