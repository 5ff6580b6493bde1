//! The universal procedure endpoint.
//!
//! ```text
//! POST /api/v1/run {"project":"ecom","action":{"procedure":"GetOrders","params":{"id":1}}}
//! ```

use actix_web::http::header::{AUTHORIZATION, HeaderMap};
use actix_web::{HttpRequest, HttpResponse, post, web};
use tracing::warn;

use crate::domain::{EngineError, EngineRequest, EngineResponse, RequestAuth};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::envelope_response;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::validate_request;

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then(|| token.to_owned())
}

/// Use the `Authorization` header when the body carries no token.
fn apply_header_token(request: &mut EngineRequest, headers: &HeaderMap) {
    let has_token = request
        .auth
        .as_ref()
        .and_then(|auth| auth.token.as_deref())
        .is_some_and(|token| !token.trim().is_empty());
    if has_token {
        return;
    }
    if let Some(token) = bearer_token(headers) {
        request.auth.get_or_insert_with(RequestAuth::default).token = Some(token);
    }
}

/// Run a registered procedure on whichever engine serves the project.
///
/// The body is validated, the caller identified, and the engine's envelope
/// returned with the HTTP status equal to `status.code`.
#[utoipa::path(
    post,
    path = "/api/v1/run",
    request_body = EngineRequest,
    responses(
        (status = 200, description = "Procedure executed", body = EngineResponse),
        (status = 400, description = "Malformed request", body = EngineResponse),
        (status = 401, description = "Caller could not be identified", body = EngineResponse),
        (status = 403, description = "Procedure not registered for the project", body = EngineResponse),
        (status = 404, description = "Unknown project", body = EngineResponse),
        (status = 500, description = "Procedure or configuration failure", body = EngineResponse),
        (status = 502, description = "Both engines failed", body = EngineResponse),
        (status = 503, description = "Engine unavailable", body = EngineResponse)
    ),
    tags = ["procedures"],
    operation_id = "runProcedure"
)]
#[post("/run")]
pub async fn run_procedure(
    state: web::Data<HttpState>,
    req: HttpRequest,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let mut request = validate_request(&body)?;
    apply_header_token(&mut request, req.headers());

    let identity = state.identity.identify(&request).await.map_err(|err| {
        warn!(error = %err, "caller identification failed");
        EngineError::unauthorized(err.to_string())
    })?;

    let response = state.procedures.run(request, identity).await;
    Ok(envelope_response(&response))
}
