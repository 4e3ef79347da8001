//! The Diamiq API client.
//!
//! # Design
//! `Client` holds the configuration and a shared `Transport`. Every
//! operation validates its arguments, builds an `HttpRequest`, awaits one
//! transport round-trip and maps the response through the same routine:
//! parse the body as JSON (empty or malformed bodies become `null`), turn
//! non-2xx statuses into `ApiError`, and hand back the JSON.
//!
//! Hosts that run their own I/O loop can skip the transport and use
//! `build_request` / `parse_response` directly.
//!
//! Operations take `&self` and may run concurrently. `set_api_key` and
//! `set_debug` take `&mut self`, so they cannot overlap in-flight calls.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ApiError, Error, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{default_transport, Transport};
use crate::types::{GenerateOptions, GenerationResult, Placeholder, PlaceholderList, TemplateFilters};
use crate::validation::check_payload;

/// Async client for the Diamiq document-generation API.
#[derive(Clone)]
pub struct Client {
    api_key: Option<String>,
    endpoint: String,
    debug: bool,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint)
            .field("has_api_key", &self.api_key.is_some())
            .field("debug", &self.debug)
            .finish()
    }
}

impl Client {
    /// Build a client from `config`.
    ///
    /// Fails when the endpoint is empty (or only slashes), or when no transport is configured
    /// and none is built in.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let ClientConfig {
            api_key,
            endpoint,
            debug,
            transport,
        } = config;

        let endpoint = endpoint.trim_end_matches('/');
        if endpoint.is_empty() {
            return Err(Error::config("\"endpoint\" must be a non-empty string."));
        }

        let transport = transport.or_else(default_transport).ok_or_else(|| {
            Error::config(
                "no HTTP transport available. Provide ClientConfig::with_transport \
                 or enable the `ureq-transport` feature.",
            )
        })?;

        Ok(Self {
            api_key: api_key.filter(|key| !key.is_empty()),
            endpoint: endpoint.to_string(),
            debug,
            transport,
        })
    }

    /// Build a client from `DIAMIQ_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// Base URL with trailing slashes removed.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn set_api_key(&mut self, key: impl Into<String>) -> Result<()> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::config("\"apiKey\" must be a non-empty string."));
        }
        self.api_key = Some(key);
        Ok(())
    }

    /// Toggle request/response diagnostics. Never changes behavior.
    pub fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }

    // -----------------------------------------------------------------------
    // Request routine
    // -----------------------------------------------------------------------

    /// Build the authenticated request for `path` without sending it.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<HttpRequest> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::config("API key is required. Call set_api_key()."))?;

        let url = if path.starts_with('/') {
            format!("{}{path}", self.endpoint)
        } else {
            format!("{}/{path}", self.endpoint)
        };

        let mut headers = vec![
            ("Authorization".to_string(), format!("Bearer {api_key}")),
            ("Accept".to_string(), "application/json".to_string()),
        ];

        let body = match body {
            Some(body) => {
                headers.push(("Content-Type".to_string(), "application/json".to_string()));
                Some(serde_json::to_string(body).map_err(Error::Serialization)?)
            }
            None => None,
        };

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    /// Interpret a response to a request built by `build_request`.
    ///
    /// Returns the parsed body, `Value::Null` when it was empty or not JSON.
    pub fn parse_response(&self, response: &HttpResponse) -> Result<Value> {
        into_result(response, parse_body(&response.body))
    }

    /// Send one authenticated request and return the parsed JSON body.
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        let request = self.build_request(method, path, body)?;
        let url = request.url.clone();

        if self.debug {
            debug!(
                url = %url,
                method = %request.method,
                has_body = request.body.is_some(),
                "[Diamiq] Request"
            );
        }

        let response = self
            .transport
            .send(request)
            .await
            .map_err(Error::Transport)?;
        let json = parse_body(&response.body);

        if self.debug {
            let logged = match &json {
                Value::Null => response.body.clone(),
                parsed => parsed.to_string(),
            };
            debug!(
                url = %url,
                status = response.status,
                body = %logged,
                "[Diamiq] Response"
            );
        }

        into_result(&response, json)
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// `GET /ping`: checks that the API is reachable and the key is accepted.
    pub async fn check_token(&self) -> Result<Value> {
        self.request(HttpMethod::Get, "/ping", None).await
    }

    /// `GET /templates`, filtered by whichever of `filters` are set.
    pub async fn get_templates(&self, filters: &TemplateFilters) -> Result<Value> {
        let query = filters.to_query();
        let path = if query.is_empty() {
            "/templates".to_string()
        } else {
            format!("/templates?{query}")
        };
        self.request(HttpMethod::Get, &path, None).await
    }

    pub async fn get_template(&self, template_id: &str) -> Result<Value> {
        require_template_id(template_id)?;
        self.request(HttpMethod::Get, &format!("/templates/{template_id}"), None)
            .await
    }

    /// Placeholder schema of a template. A `null` body yields an empty list.
    pub async fn get_placeholders(&self, template_id: &str) -> Result<PlaceholderList> {
        require_template_id(template_id)?;
        let json = self
            .request(
                HttpMethod::Get,
                &format!("/templates/{template_id}/placeholders"),
                None,
            )
            .await?;
        match json {
            Value::Null => Ok(PlaceholderList::default()),
            json => serde_json::from_value(json).map_err(Error::Decode),
        }
    }

    /// Check the keys of `payload` against the template's placeholders.
    ///
    /// Fetches the placeholders when `placeholders` is `None`. Resolves to
    /// `true`, or fails with a `PAYLOAD_INVALID` `ApiError` whose metadata
    /// lists the `missing` and `extra` keys.
    pub async fn validate_payload<P>(
        &self,
        template_id: &str,
        payload: &P,
        placeholders: Option<&[Placeholder]>,
    ) -> Result<bool>
    where
        P: Serialize + ?Sized,
    {
        let payload = to_object(payload, "payload")?;

        let fetched: Vec<Placeholder>;
        let placeholders = match placeholders {
            Some(placeholders) => placeholders,
            None => {
                fetched = self.get_placeholders(template_id).await?.placeholders;
                fetched.as_slice()
            }
        };

        check_payload(placeholders, &payload).into_result()?;
        Ok(true)
    }

    /// `POST /documents/generate` with body `{template_id, data, ...options}`.
    ///
    /// Resolves to `None` when a successful response has an empty or
    /// non-JSON body.
    pub async fn generate<D>(
        &self,
        template_id: &str,
        data: &D,
        options: &GenerateOptions,
    ) -> Result<Option<GenerationResult>>
    where
        D: Serialize + ?Sized,
    {
        require_template_id(template_id)?;
        let data = to_object(data, "data")?;

        let mut body = Map::new();
        body.insert("template_id".to_string(), Value::from(template_id));
        body.insert("data".to_string(), Value::Object(data));
        if let Value::Object(options) = serde_json::to_value(options).map_err(Error::Serialization)? {
            body.extend(options);
        }

        let json = self
            .request(
                HttpMethod::Post,
                "/documents/generate",
                Some(&Value::Object(body)),
            )
            .await?;
        match json {
            Value::Null => Ok(None),
            json => serde_json::from_value(json).map(Some).map_err(Error::Decode),
        }
    }
}

fn require_template_id(template_id: &str) -> Result<()> {
    if template_id.is_empty() {
        return Err(Error::config("\"templateId\" must be a non-empty string."));
    }
    Ok(())
}

fn to_object<T: Serialize + ?Sized>(value: &T, name: &str) -> Result<Map<String, Value>> {
    match serde_json::to_value(value).map_err(Error::Serialization)? {
        Value::Object(map) => Ok(map),
        _ => Err(Error::config(format!("\"{name}\" must be an object."))),
    }
}

/// Parse a response body, treating empty or malformed text as `null`.
fn parse_body(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(raw).unwrap_or(Value::Null)
}

fn into_result(response: &HttpResponse, json: Value) -> Result<Value> {
    if response.is_success() {
        Ok(json)
    } else {
        Err(ApiError::from_response(response.status, &json).into())
    }
}
