//! Structural validation of the request body.
//!
//! Checks run on the raw JSON so callers get a precise message instead of a
//! generic deserialisation error. Only the envelope's shape is checked here;
//! names and registry membership are the engine's concern.

use serde_json::{Map, Value};

use crate::domain::{EngineError, EngineRequest};

/// Optional members of `action` and the root that must be objects.
const ACTION_OBJECTS: [&str; 2] = ["params", "form"];
const ROOT_OBJECTS: [&str; 2] = ["auth", "meta"];

fn invalid(message: impl Into<String>) -> EngineError {
    EngineError::invalid_request(message)
}

/// A present, non-null member must be an object.
fn check_object(parent: &Map<String, Value>, key: &str, label: &str) -> Result<(), EngineError> {
    match parent.get(key) {
        None | Some(Value::Null | Value::Object(_)) => Ok(()),
        Some(_) => Err(invalid(format!("{label} must be an object"))),
    }
}

/// Validate `body` and decode it into an [`EngineRequest`].
///
/// # Examples
/// ```
/// use hybrid_engine::inbound::http::validation::validate_request;
///
/// let request = validate_request(br#"{"action":{"procedure":"GetOrders"}}"#).expect("valid");
/// assert_eq!(request.procedure(), Some("GetOrders"));
/// assert!(validate_request(br#"{"action":{"procedure":""}}"#).is_err());
/// ```
pub fn validate_request(body: &[u8]) -> Result<EngineRequest, EngineError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| invalid("Invalid request body"))?;
    let Value::Object(root) = &value else {
        return Err(invalid("Invalid request body"));
    };

    let Some(Value::Object(action)) = root.get("action") else {
        return Err(invalid("Action object is required"));
    };

    match action.get("procedure") {
        Some(Value::String(name)) if !name.trim().is_empty() => {}
        _ => return Err(invalid("action.procedure is required")),
    }

    for key in ACTION_OBJECTS {
        check_object(action, key, &format!("action.{key}"))?;
    }
    for key in ROOT_OBJECTS {
        check_object(root, key, key)?;
    }

    serde_json::from_value(value).map_err(|err| invalid(format!("Invalid request body: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(b"not json".as_slice(), "Invalid request body")]
    #[case(b"[1, 2]".as_slice(), "Invalid request body")]
    #[case(br#"{"project":"ecom"}"#.as_slice(), "Action object is required")]
    #[case(br#"{"action":"GetOrders"}"#.as_slice(), "Action object is required")]
    #[case(br#"{"action":{}}"#.as_slice(), "action.procedure is required")]
    #[case(br#"{"action":{"procedure":42}}"#.as_slice(), "action.procedure is required")]
    #[case(br#"{"action":{"procedure":"  "}}"#.as_slice(), "action.procedure is required")]
    #[case(br#"{"action":{"procedure":"P","params":[1]}}"#.as_slice(), "action.params must be an object")]
    #[case(br#"{"action":{"procedure":"P","form":"x"}}"#.as_slice(), "action.form must be an object")]
    #[case(br#"{"action":{"procedure":"P"},"auth":"token"}"#.as_slice(), "auth must be an object")]
    #[case(br#"{"action":{"procedure":"P"},"meta":7}"#.as_slice(), "meta must be an object")]
    fn malformed_bodies_are_rejected(#[case] body: &[u8], #[case] message: &str) {
        let error = validate_request(body).expect_err("invalid");
        assert_eq!(error.code(), "INVALID_REQUEST");
        assert_eq!(error.to_string(), message);
    }

    #[rstest]
    fn complete_requests_decode() {
        let body = br#"{
            "project": "ecom",
            "action": {"procedure": "GetOrders", "params": {"id": 1}, "form": null},
            "auth": {"token": "t", "companyDb": "ClientA_DB"},
            "meta": {"requestId": "req-1"}
        }"#;

        let request = validate_request(body).expect("valid");
        assert_eq!(request.project.as_deref(), Some("ecom"));
        assert_eq!(request.request_id(), Some("req-1"));
        assert_eq!(
            request.auth.and_then(|auth| auth.company_db).as_deref(),
            Some("ClientA_DB")
        );
    }

    #[rstest]
    fn mistyped_known_fields_are_reported() {
        let error = validate_request(br#"{"project":7,"action":{"procedure":"P"}}"#)
            .expect_err("project must be a string");
        assert!(error.to_string().starts_with("Invalid request body"), "{error}");
    }
}
