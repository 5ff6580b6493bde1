//! Reqwest-backed Supabase RPC engine.
//!
//! This adapter owns transport details only: URL construction, headers,
//! timeout and HTTP error mapping, and JSON decoding into [`RemoteReturn`].

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode, Url};
use zeroize::Zeroizing;

use super::dto::{RpcArgumentsDto, RpcErrorDto, into_remote_return};
use crate::domain::ProcedureCall;
use crate::domain::ports::{RemoteEngine, RemoteEngineError, RemoteReturn};

/// Reasons a [`SupabaseRpcEngine`] cannot be built.
#[derive(Debug, thiserror::Error)]
pub enum SupabaseConfigError {
    #[error("remote URL '{url}' cannot carry a path")]
    InvalidUrl { url: String },
    #[error("remote API key must not be empty")]
    MissingKey,
    #[error("HTTP client could not be built: {0}")]
    Client(#[from] reqwest::Error),
}

/// [`RemoteEngine`] calling `POST {url}/rest/v1/rpc/{procedure}`.
pub struct SupabaseRpcEngine {
    client: Client,
    base: Url,
    api_key: Zeroizing<String>,
}

impl fmt::Debug for SupabaseRpcEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseRpcEngine")
            .field("base", &self.base.as_str())
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl SupabaseRpcEngine {
    /// Build an engine using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Fails when the URL cannot take a path, the key is blank, or the client
    /// cannot be constructed.
    pub fn new(
        base: Url,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SupabaseConfigError> {
        if base.cannot_be_a_base() {
            return Err(SupabaseConfigError::InvalidUrl {
                url: base.to_string(),
            });
        }
        let api_key = Zeroizing::new(api_key.into());
        if api_key.trim().is_empty() {
            return Err(SupabaseConfigError::MissingKey);
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base,
            api_key,
        })
    }

    fn endpoint(&self, procedure: &str) -> Result<Url, RemoteEngineError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteEngineError::not_configured())?
            .pop_if_empty()
            .extend(["rest", "v1", "rpc", procedure]);
        Ok(url)
    }
}

#[async_trait]
impl RemoteEngine for SupabaseRpcEngine {
    async fn call(&self, call: &ProcedureCall<'_>) -> Result<RemoteReturn, RemoteEngineError> {
        let url = self.endpoint(call.procedure.as_str())?;
        let response = self
            .client
            .post(url)
            .header("apikey", self.api_key.as_str())
            .bearer_auth(self.api_key.as_str())
            .header(ACCEPT, "application/json")
            .json(&RpcArgumentsDto {
                param_obj: call.params(),
                data_obj: call.data(),
            })
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_reply(body.as_ref())
    }
}

fn parse_reply(body: &[u8]) -> Result<RemoteReturn, RemoteEngineError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RemoteReturn::Raw(serde_json::Value::Null));
    }
    serde_json::from_slice(body)
        .map(into_remote_return)
        .map_err(|error| RemoteEngineError::decode(format!("invalid RPC JSON payload: {error}")))
}

fn map_transport_error(error: reqwest::Error) -> RemoteEngineError {
    if error.is_timeout() {
        RemoteEngineError::timeout(error.to_string())
    } else if error.is_decode() || error.is_body() {
        RemoteEngineError::decode(error.to_string())
    } else {
        RemoteEngineError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> RemoteEngineError {
    let dto: RpcErrorDto = serde_json::from_slice(body).unwrap_or_default();
    let message = dto
        .summary()
        .unwrap_or_else(|| format!("status {}", status.as_u16()));
    RemoteEngineError::status(status.as_u16(), dto.code, message)
}
