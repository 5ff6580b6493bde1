//! HTTP rendering of engine envelopes and errors.
//!
//! Every response from the procedure endpoint is the canonical envelope. The
//! HTTP status always equals `status.code`, so clients may branch on either.

use actix_web::http::StatusCode;
use actix_web::http::header::{CACHE_CONTROL, HeaderValue};
use actix_web::{HttpResponse, ResponseError};
use chrono::Utc;
use tracing::error;

use crate::domain::{EngineError, EngineResponse, ResponseMeta, RuntimeMode, TraceId};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, EngineError>;

fn status_for(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or_else(|_| {
        error!(code, "envelope carried an invalid HTTP status");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Render an envelope with the status it carries.
pub fn envelope_response(response: &EngineResponse) -> HttpResponse {
    HttpResponse::build(status_for(response.status.code))
        .insert_header((CACHE_CONTROL, HeaderValue::from_static("no-store")))
        .json(response)
}

/// Envelope for failures raised before the engine runs.
///
/// These never carry backend detail, so the runtime mode is irrelevant and
/// production rendering is used.
pub fn rejection_envelope(error: &EngineError) -> EngineResponse {
    let meta = ResponseMeta::new(
        TraceId::current().map(|id| id.to_string()),
        Utc::now().timestamp_millis(),
    );
    EngineResponse::failure(error, meta, RuntimeMode::Production)
}

impl ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        status_for(EngineError::status_code(self))
    }

    fn error_response(&self) -> HttpResponse {
        envelope_response(&rejection_envelope(self))
    }
}
