//! Normalization of raw HTTP responses into a uniform envelope.
//!
//! The rules, in order:
//! - success status, empty body: `status: true`, nothing else
//! - success status, JSON body: `status: true` plus the parsed body
//! - error status, JSON body: `status: false` plus whatever of
//!   `title` / `type` / `errors` the body carries
//! - any status, unparseable body: `status: false` with a fixed
//!   "Unable to parse response" marker and the raw text preserved -
//!   intermediary proxies love to answer with HTML error pages
//!
//! A success status with a body that cannot be parsed counts as a
//! failure: the caller cannot trust an envelope it cannot open.
//! Normalization never fails and never panics.

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::Error;

/// Marker title reported when a body could not be parsed as JSON
const PARSE_FAILURE_TITLE: &str = "Unable to parse response";

/// Error details lifted from a problem-style JSON error body.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ErrorInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
}

/// Uniform result shape handed to resource callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// Logical success: HTTP success *and* a body we could open
    pub status: bool,
    /// HTTP status code the envelope was built from
    pub code: u16,
    /// Parsed JSON body on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Error details on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    /// Raw body text when it was not parseable as JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

/// Tagged view of an envelope, separating "absent" from "failed".
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Option<Value>),
    NotFound,
    Failed(Option<ErrorInfo>),
}

impl Envelope {
    /// Consume a response and normalize it. Only transport failures
    /// while reading the body surface as errors; everything about the
    /// payload itself becomes envelope data.
    pub async fn from_response(response: reqwest::Response) -> Result<Self, Error> {
        let status = response.status();
        let body = response.text().await?;
        Ok(normalize(status, &body))
    }

    /// Tagged view per the caller-facing contract: success, absence,
    /// or failure with details.
    pub fn outcome(self) -> Outcome {
        if self.status {
            Outcome::Success(self.data)
        } else if self.code == StatusCode::NOT_FOUND.as_u16() {
            Outcome::NotFound
        } else {
            Outcome::Failed(self.error)
        }
    }

    /// Deserialize the success payload into a concrete type.
    pub fn parse_data<T: serde::de::DeserializeOwned>(&self) -> Result<T, Error> {
        let data = self
            .data
            .clone()
            .ok_or_else(|| Error::InvalidResponse("envelope has no data".to_string()))?;
        serde_json::from_value(data).map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

/// Pure normalization over status and body text. Feeding the same
/// inputs twice yields structurally equal envelopes.
pub fn normalize(status: StatusCode, body: &str) -> Envelope {
    let code = status.as_u16();

    if body.trim().is_empty() {
        return Envelope {
            status: status.is_success(),
            code,
            data: None,
            error: None,
            raw: None,
        };
    }

    let parsed: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            debug!(code, error = %e, "response body is not JSON");
            return Envelope {
                status: false,
                code,
                data: None,
                error: Some(ErrorInfo {
                    title: Some(PARSE_FAILURE_TITLE.to_string()),
                    ..ErrorInfo::default()
                }),
                raw: Some(body.to_string()),
            };
        }
    };

    if status.is_success() {
        Envelope {
            status: true,
            code,
            data: Some(parsed),
            error: None,
            raw: None,
        }
    } else {
        Envelope {
            status: false,
            code,
            data: None,
            error: Some(error_info(&parsed)),
            raw: None,
        }
    }
}

/// Lift `title` / `type` / `errors` out of a JSON error body.
fn error_info(body: &Value) -> ErrorInfo {
    ErrorInfo {
        title: body
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string),
        kind: body.get("type").and_then(Value::as_str).map(str::to_string),
        errors: body.get("errors").cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_with_json_body() {
        let envelope = normalize(StatusCode::OK, r#"{"data": {"id": 7}}"#);
        assert!(envelope.status);
        assert_eq!(envelope.code, 200);
        assert_eq!(envelope.data, Some(json!({"data": {"id": 7}})));
        assert!(envelope.error.is_none());
    }

    #[test]
    fn test_success_with_empty_body() {
        let envelope = normalize(StatusCode::NO_CONTENT, "");
        assert!(envelope.status);
        assert!(envelope.data.is_none());
        assert!(envelope.error.is_none());
        assert!(envelope.raw.is_none());
    }

    #[test]
    fn test_not_found_error_body() {
        let envelope = normalize(
            StatusCode::NOT_FOUND,
            r#"{"title":"Not Found","type":"/errors/404"}"#,
        );
        assert!(!envelope.status);
        let error = envelope.error.as_ref().unwrap();
        assert_eq!(error.title.as_deref(), Some("Not Found"));
        assert_eq!(error.kind.as_deref(), Some("/errors/404"));
        assert!(error.errors.is_none());
        assert_eq!(envelope.outcome(), Outcome::NotFound);
    }

    #[test]
    fn test_validation_errors_field() {
        let envelope = normalize(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"title":"Invalid","errors":{"code":["required"]}}"#,
        );
        let error = envelope.error.unwrap();
        assert_eq!(error.errors, Some(json!({"code": ["required"]})));
    }

    #[test]
    fn test_html_error_page_is_preserved_raw() {
        let body = "<html><body>502 Bad Gateway</body></html>";
        let envelope = normalize(StatusCode::BAD_GATEWAY, body);
        assert!(!envelope.status);
        assert_eq!(
            envelope.error.unwrap().title.as_deref(),
            Some("Unable to parse response")
        );
        assert_eq!(envelope.raw.as_deref(), Some(body));
    }

    #[test]
    fn test_success_status_with_garbage_body_is_a_failure() {
        let envelope = normalize(StatusCode::OK, "not json at all");
        assert!(!envelope.status);
        assert_eq!(
            envelope.error.unwrap().title.as_deref(),
            Some("Unable to parse response")
        );
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let body = r#"{"title":"Not Found","type":"/errors/404"}"#;
        let first = normalize(StatusCode::NOT_FOUND, body);
        let second = normalize(StatusCode::NOT_FOUND, body);
        assert_eq!(first, second);
    }

    #[test]
    fn test_outcome_tags() {
        let ok = normalize(StatusCode::OK, r#"{"id": 1}"#);
        assert_eq!(ok.outcome(), Outcome::Success(Some(json!({"id": 1}))));

        let failed = normalize(StatusCode::INTERNAL_SERVER_ERROR, r#"{"title":"boom"}"#);
        assert!(matches!(failed.outcome(), Outcome::Failed(Some(_))));
    }

    #[test]
    fn test_parse_data_into_typed_value() {
        #[derive(serde::Deserialize)]
        struct Item {
            id: i64,
        }
        let envelope = normalize(StatusCode::OK, r#"{"id": 42}"#);
        let item: Item = envelope.parse_data().unwrap();
        assert_eq!(item.id, 42);
    }
}
