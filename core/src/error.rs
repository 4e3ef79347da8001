//! Error types for the Diamiq client.
//!
//! # Design
//! Callers see two broad shapes. `Error::Config` covers usage mistakes caught
//! before any I/O (missing API key, empty template id, non-object payload).
//! `Error::Api` wraps `ApiError`, the uniform record built either from a
//! non-2xx response or from local payload validation. Transport failures are
//! passed through untouched in `Error::Transport`.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::transport::TransportError;

/// Code used when the server does not supply one.
pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";

/// Code used by `Client::validate_payload`.
pub const PAYLOAD_INVALID: &str = "PAYLOAD_INVALID";

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure a client operation can return.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration or call arguments. Never reaches the network.
    #[error("[Diamiq] {0}")]
    Config(String),

    /// The API rejected the request, or the payload failed local validation.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The transport failed before a response was available.
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),

    /// The request body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A successful response did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(#[source] serde_json::Error),
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// The unified API error, if this is one.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }

    /// HTTP status of an `Api` error.
    pub fn status(&self) -> Option<u16> {
        self.as_api().map(|e| e.status)
    }

    /// Error code of an `Api` error.
    pub fn code(&self) -> Option<&str> {
        self.as_api().map(|e| e.code.as_str())
    }
}

/// Uniform error record for API and validation failures.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    pub status: u16,
    pub code: String,
    pub metadata: Map<String, Value>,
}

impl ApiError {
    pub fn new(
        message: impl Into<String>,
        status: u16,
        code: impl Into<String>,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            message: message.into(),
            status,
            code: code.into(),
            metadata,
        }
    }

    /// Map a non-2xx response onto an `ApiError`.
    ///
    /// `body` is the parsed response, `Value::Null` when the body was empty or
    /// not JSON. Each field falls back independently: message from `message`
    /// then `error`, code from `code`, metadata from `meta` then `details` then
    /// the whole body.
    pub fn from_response(status: u16, body: &Value) -> Self {
        let message = first_truthy(body, &["message", "error"])
            .map(display_value)
            .unwrap_or_else(|| format!("Request failed with status {status}"));

        let code = first_truthy(body, &["code"])
            .map(display_value)
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string());

        let metadata = match first_truthy(body, &["meta", "details"]).or(truthy(body)) {
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                let mut map = Map::new();
                map.insert("value".to_string(), other.clone());
                map
            }
            None => Map::new(),
        };

        Self::new(message, status, code, metadata)
    }

    /// Build the `PAYLOAD_INVALID` error raised by payload validation.
    pub fn payload_invalid(missing: Vec<String>, extra: Vec<String>) -> Self {
        let mut metadata = Map::new();
        metadata.insert("missing".to_string(), Value::from(missing));
        metadata.insert("extra".to_string(), Value::from(extra));
        Self::new("Payload validation failed.", 400, PAYLOAD_INVALID, metadata)
    }

    pub fn is_payload_invalid(&self) -> bool {
        self.code == PAYLOAD_INVALID
    }

    /// Required keys the payload lacked. Empty unless this is a validation error.
    pub fn missing(&self) -> Vec<String> {
        self.string_list("missing")
    }

    /// Keys the payload carried that the template does not declare.
    pub fn extra(&self) -> Vec<String> {
        self.string_list("extra")
    }

    fn string_list(&self, field: &str) -> Vec<String> {
        self.metadata
            .get(field)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Mirrors the loose truthiness the API's error bodies are written against:
/// null, false, 0 and "" count as absent.
fn truthy(value: &Value) -> Option<&Value> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other),
    }
}

fn first_truthy<'a>(body: &'a Value, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .find_map(|field| body.get(field).and_then(truthy))
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
