//! Behaviour tests for end-to-end hybrid dispatch.
//!
//! Each scenario drives the assembled engine with scripted backends and
//! inspects the rendered envelope plus the calls each backend observed.

use std::sync::Mutex;

use hybrid_engine::domain::{Engine, EngineResponse};
use hybrid_engine::test_support::ScriptedRelationalEngine;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tokio::runtime::Runtime;

// Shared harness has helpers used by other integration suites.
#[allow(dead_code)]
mod support;

use support::{Harness, call, ecom, healthy_remote, healthy_sql};

struct DispatchWorld {
    runtime: Runtime,
    harness: Option<Harness>,
    response: Option<EngineResponse>,
}

impl std::fmt::Debug for DispatchWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchWorld")
            .field("harness", &self.harness.as_ref().map(|_| "<Harness>"))
            .field("response", &self.response)
            .finish_non_exhaustive()
    }
}

impl DispatchWorld {
    fn harness(&self) -> &Harness {
        self.harness.as_ref().expect("project should be set up")
    }

    fn response(&self) -> &EngineResponse {
        self.response.as_ref().expect("a call should have been made")
    }
}

#[fixture]
fn world() -> Mutex<DispatchWorld> {
    Mutex::new(DispatchWorld {
        runtime: Runtime::new().expect("tokio runtime should initialize"),
        harness: None,
        response: None,
    })
}

// -----------------------------------------------------------------------------
// Given Steps
// -----------------------------------------------------------------------------

#[given("the ecom project with healthy engines")]
fn the_ecom_project_with_healthy_engines(world: &Mutex<DispatchWorld>) {
    world.lock().expect("world lock").harness = Some(Harness::new(healthy_sql(), healthy_remote()));
}

#[given("the ecom project whose relational engine raises SQLSTATE {sqlstate}")]
fn the_relational_engine_raises(world: &Mutex<DispatchWorld>, sqlstate: String) {
    world.lock().expect("world lock").harness = Some(Harness::new(
        ScriptedRelationalEngine::failing(&sqlstate, "duplicate key value violates unique constraint"),
        hybrid_engine::test_support::ScriptedRemoteEngine::disabled(),
    ));
}

#[given("the ecom project whose relational host is unreachable")]
fn the_relational_host_is_unreachable(world: &Mutex<DispatchWorld>) {
    world.lock().expect("world lock").harness = Some(Harness::new(
        ScriptedRelationalEngine::unreachable(),
        healthy_remote(),
    ));
}

// -----------------------------------------------------------------------------
// When Steps
// -----------------------------------------------------------------------------

#[when("the client calls {procedure} with companyDb {company_db}")]
fn the_client_calls(world: &Mutex<DispatchWorld>, procedure: String, company_db: String) {
    let mut world = world.lock().expect("world lock");
    let request = call(&procedure, &company_db);
    let response = world.runtime.block_on(world.harness().run(&request));
    world.response = Some(response);
}

// -----------------------------------------------------------------------------
// Then Steps
// -----------------------------------------------------------------------------

#[then("the response succeeds")]
fn the_response_succeeds(world: &Mutex<DispatchWorld>) {
    let world = world.lock().expect("world lock");
    let response = world.response();
    assert!(response.is_success(), "unexpected failure: {response:?}");
    assert_eq!(response.status.code, 200);
}

#[then("the relational engine ran against {database}")]
fn the_relational_engine_ran_against(world: &Mutex<DispatchWorld>, database: String) {
    let world = world.lock().expect("world lock");
    assert_eq!(world.harness().last_database().as_deref(), Some(database.as_str()));
    assert_eq!(
        world.response().meta.company_db.as_deref(),
        Some(database.as_str())
    );
}

#[then("the response fails with error code {code}")]
fn the_response_fails_with(world: &Mutex<DispatchWorld>, code: String) {
    let world = world.lock().expect("world lock");
    let response = world.response();
    assert!(!response.status.success);
    let error = response.error.as_ref().expect("error block");
    assert_eq!(error.code, code);
    assert_eq!(response.status_code, response.status.code);
}

#[then("the error is not retryable")]
fn the_error_is_not_retryable(world: &Mutex<DispatchWorld>) {
    let world = world.lock().expect("world lock");
    let error = world.response().error.as_ref().expect("error block");
    assert!(!error.retryable);
    assert!(error.details.is_none(), "production mode hides backend detail");
}

#[then("the response was served by {engine}")]
fn the_response_was_served_by(world: &Mutex<DispatchWorld>, engine: String) {
    let world = world.lock().expect("world lock");
    let served = world.response().meta.db.expect("engine recorded");
    assert_eq!(served.as_str(), engine);
}

#[then("the backend mode for ecom is remote")]
fn the_backend_mode_is_remote(world: &Mutex<DispatchWorld>) {
    let world = world.lock().expect("world lock");
    assert_eq!(world.harness().engine.cached_mode(&ecom()), Some(Engine::Remote));
}

#[then("no relational pool was created")]
fn no_relational_pool_was_created(world: &Mutex<DispatchWorld>) {
    let world = world.lock().expect("world lock");
    assert_eq!(world.harness().relational.connect_count(), 0);
    assert_eq!(world.harness().engine.pool_count(), 0);
}

#[scenario(
    path = "tests/features/hybrid_dispatch.feature",
    name = "Tenant procedures run on the caller's database"
)]
fn tenant_procedures_run_on_the_callers_database(world: Mutex<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/hybrid_dispatch.feature",
    name = "Master procedures ignore the tenant override"
)]
fn master_procedures_ignore_the_tenant_override(world: Mutex<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/hybrid_dispatch.feature",
    name = "Duplicate keys surface as a canonical data error"
)]
fn duplicate_keys_surface_as_a_canonical_data_error(world: Mutex<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/hybrid_dispatch.feature",
    name = "An unreachable relational engine hands the project to the remote engine"
)]
fn unreachable_relational_engine_hands_the_project_to_remote(world: Mutex<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/hybrid_dispatch.feature",
    name = "Unregistered procedures are rejected before any pool exists"
)]
fn unregistered_procedures_are_rejected_before_any_pool_exists(world: Mutex<DispatchWorld>) {
    drop(world);
}
