//! Hybrid procedure execution engine.
//!
//! Routes "run procedure P with parameters" requests to a relational engine
//! or a remote function-call engine and returns one canonical envelope
//! whichever backend served the call.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
