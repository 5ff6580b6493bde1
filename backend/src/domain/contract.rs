//! Request and response envelopes exchanged with callers.
//!
//! The request mirrors what clients send; the response is the single shape
//! every call produces, whichever engine served it and however it failed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::canonical::{CanonicalResult, Dataset, Engine, ErrorCategory};
use super::error::EngineError;
use super::error_mapper::RuntimeMode;

/// Inbound "run this procedure" request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineRequest {
    /// Project; falls back to the process default when absent.
    #[schema(example = "ecom")]
    pub project: Option<String>,
    pub action: Option<RequestAction>,
    pub auth: Option<RequestAuth>,
    pub meta: Option<RequestMeta>,
    /// Legacy flat payload, used only where `action` leaves a gap.
    pub payload: Option<LegacyPayload>,
}

impl EngineRequest {
    /// Request calling `procedure` with no arguments.
    pub fn for_procedure(procedure: impl Into<String>) -> Self {
        Self {
            action: Some(RequestAction {
                procedure: procedure.into(),
                ..RequestAction::default()
            }),
            ..Self::default()
        }
    }

    /// Caller-supplied request id, if any.
    pub fn request_id(&self) -> Option<&str> {
        self.meta
            .as_ref()
            .and_then(|meta| meta.request_id.as_deref())
            .filter(|id| !id.trim().is_empty())
    }

    /// Raw procedure name as sent.
    pub fn procedure(&self) -> Option<&str> {
        self.action.as_ref().map(|action| action.procedure.as_str())
    }
}

/// The structured call description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct RequestAction {
    #[schema(example = "GetOrders")]
    pub procedure: String,
    /// Filter and lookup arguments.
    #[schema(value_type = Option<Object>)]
    pub params: Option<Map<String, Value>>,
    /// Form fields for mutations.
    #[schema(value_type = Option<Object>)]
    pub form: Option<Map<String, Value>>,
}

/// Credential claims attached to the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestAuth {
    pub token: Option<String>,
    /// Tenant database selected by the caller's session.
    #[schema(example = "ClientA_DB")]
    pub company_db: Option<String>,
    pub user_id: Option<String>,
}

/// Caller metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestMeta {
    pub request_id: Option<String>,
    pub source: Option<String>,
}

/// Pre-`action` payload shape still sent by older clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct LegacyPayload {
    #[schema(value_type = Option<Object>)]
    pub params: Option<Map<String, Value>>,
    #[schema(value_type = Option<Object>)]
    pub data: Option<Map<String, Value>>,
}

/// Overall outcome of a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ResponseStatus {
    pub code: u16,
    pub success: bool,
    pub message: String,
}

/// Record-sets returned by the procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ResponseData {
    #[schema(value_type = Object)]
    pub tables: Dataset,
}

/// Failure description; present only on failed calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ResponseError {
    #[schema(example = "SQL_DUPLICATE_KEY")]
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<Engine>,
    pub retryable: bool,
    #[serde(rename = "type")]
    pub category: ErrorCategory,
    pub message: String,
    /// Raw backend detail, development mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Call metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Milliseconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Engine that served the call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db: Option<Engine>,
    /// Physical database the call targeted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_db: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procedure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl ResponseMeta {
    pub fn new(request_id: Option<String>, timestamp: i64) -> Self {
        Self {
            request_id,
            timestamp: Some(timestamp),
            ..Self::default()
        }
    }
}

/// Canonical response envelope.
///
/// `statusCode` and `message` duplicate `status` for clients predating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EngineResponse {
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
    pub meta: ResponseMeta,
    pub status_code: u16,
    pub message: String,
}

impl EngineResponse {
    /// Render a call the backend answered, including procedure-level failures.
    pub fn from_result(result: CanonicalResult, mut meta: ResponseMeta) -> Self {
        meta.duration_ms = Some(result.meta.duration_ms);
        meta.db = Some(result.meta.backend);
        meta.company_db = result.meta.database.map(String::from);
        meta.procedure = Some(result.meta.procedure.into());
        meta.project = Some(result.meta.project.into());

        Self {
            status: ResponseStatus {
                code: result.status_code,
                success: result.success,
                message: result.message.clone(),
            },
            data: Some(ResponseData {
                tables: result.dataset,
            }),
            error: None,
            meta,
            status_code: result.status_code,
            message: result.message,
        }
    }

    /// Render a failed call.
    ///
    /// `details` is only filled in [`RuntimeMode::Development`].
    pub fn failure(error: &EngineError, meta: ResponseMeta, mode: RuntimeMode) -> Self {
        let code = error.status_code();
        let message = error.user_message();
        let details = if mode.exposes_debug() {
            error.debug_detail()
        } else {
            None
        };

        Self {
            status: ResponseStatus {
                code,
                success: false,
                message: message.clone(),
            },
            data: None,
            error: Some(ResponseError {
                code: error.code().to_owned(),
                engine: error.engine(),
                retryable: error.retryable(),
                category: error.category(),
                message: message.clone(),
                details,
            }),
            meta,
            status_code: code,
            message,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.success
    }
}
