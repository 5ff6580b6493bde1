//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the procedure endpoint, the health probes and the
//! request/response envelope schemas. The document is served by Swagger UI in
//! debug builds and exported via `cargo run --bin openapi-dump`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{
    Engine, EngineRequest, EngineResponse, ErrorCategory, LegacyPayload, RequestAction,
    RequestAuth, RequestMeta, ResponseData, ResponseError, ResponseMeta, ResponseStatus,
};
use crate::inbound::http::health::ProbeReport;

/// Enrich the generated document with the bearer token scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some(
                        "Caller token; `auth.token` in the body is accepted as well.",
                    ))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the HTTP surface.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Hybrid procedure engine API",
        description = "Runs registered stored procedures on the relational or remote engine and returns one canonical envelope."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::run::run_procedure,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        EngineRequest,
        RequestAction,
        RequestAuth,
        RequestMeta,
        LegacyPayload,
        EngineResponse,
        ResponseStatus,
        ResponseData,
        ResponseError,
        ResponseMeta,
        Engine,
        ErrorCategory,
        ProbeReport
    )),
    tags(
        (name = "procedures", description = "Procedure execution"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
