//! DTOs for the RPC request body and its replies.
//!
//! Replies are classified here, once: a function returning an object with a
//! numeric `statusCode` speaks the engine envelope; anything else is raw data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::ports::{RemoteDataset, RemoteEnvelope, RemoteReturn};

/// Named arguments every engine function receives.
#[derive(Debug, Serialize)]
pub(super) struct RpcArgumentsDto<'a> {
    #[serde(rename = "ParamObj")]
    pub(super) param_obj: &'a Map<String, Value>,
    #[serde(rename = "DataObj")]
    pub(super) data_obj: &'a Map<String, Value>,
}

/// PostgREST error body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct RpcErrorDto {
    pub(super) code: Option<String>,
    pub(super) message: Option<String>,
    pub(super) details: Option<String>,
    pub(super) hint: Option<String>,
}

impl RpcErrorDto {
    /// Human-readable summary for logs and development-mode detail.
    pub(super) fn summary(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.message, &self.details, &self.hint]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.trim().is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" | "))
    }
}

fn records(value: Value) -> Vec<Value> {
    match value {
        Value::Array(records) => records,
        Value::Null => Vec::new(),
        record => vec![record],
    }
}

fn dataset(value: Option<Value>) -> RemoteDataset {
    match value {
        None | Some(Value::Null) => RemoteDataset::Empty,
        Some(Value::Array(sets)) if sets.iter().all(Value::is_array) => {
            RemoteDataset::Positional(sets.into_iter().map(records).collect())
        }
        Some(Value::Object(named)) => {
            RemoteDataset::Named(named.into_iter().map(|(name, set)| (name, records(set))).collect())
        }
        Some(single) => RemoteDataset::Positional(vec![records(single)]),
    }
}

fn status_code(value: &Value) -> Option<u16> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|code| u16::try_from(code).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Classify a decoded 2xx body.
pub(super) fn into_remote_return(body: Value) -> RemoteReturn {
    let Value::Object(mut object) = body else {
        return RemoteReturn::Raw(body);
    };
    let Some(code) = object.get("statusCode").and_then(status_code) else {
        return RemoteReturn::Raw(Value::Object(object));
    };

    let message = object
        .remove("message")
        .and_then(|message| message.as_str().map(str::to_owned));
    let data = object.remove("dataset").or_else(|| object.remove("data"));
    RemoteReturn::Envelope(RemoteEnvelope {
        status_code: code,
        message,
        dataset: dataset(data),
    })
}
