//! The injected HTTP capability.
//!
//! # Design
//! The client never opens sockets itself. It hands a fully built
//! `HttpRequest` to a `Transport` and gets back an `HttpResponse` whose body
//! has been read to the end. Any `Fn(HttpRequest) -> Future` closure is a
//! transport, which keeps test doubles to a few lines. The built-in
//! `UreqTransport` is compiled in with the `ureq-transport` feature and is
//! what `Client::new` falls back to when none is configured.
//!
//! Timeouts and cancellation belong to the transport. Errors it raises reach
//! the caller unchanged as `Error::Transport`.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::http::{HttpRequest, HttpResponse};

/// Error raised by a transport, passed through to callers unmapped.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Executes one HTTP round-trip.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and return the response with its full body.
    ///
    /// Non-2xx statuses are ordinary responses, not errors.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<F, Fut> Transport for F
where
    F: Fn(HttpRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HttpResponse, TransportError>> + Send + 'static,
{
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (self)(request).await
    }
}

/// The transport used when the configuration does not name one, or `None`
/// when no built-in transport was compiled in.
pub fn default_transport() -> Option<Arc<dyn Transport>> {
    #[cfg(feature = "ureq-transport")]
    {
        let transport: Arc<dyn Transport> = Arc::new(UreqTransport::new());
        Some(transport)
    }
    #[cfg(not(feature = "ureq-transport"))]
    {
        None
    }
}

#[cfg(feature = "ureq-transport")]
pub use self::ureq_transport::UreqTransport;

#[cfg(feature = "ureq-transport")]
mod ureq_transport {
    use async_trait::async_trait;

    use super::{Transport, TransportError};
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Blocking `ureq` agent.
    ///
    /// Inside a tokio runtime the call runs on the blocking pool; under any
    /// other executor it runs inline on the polling thread.
    #[derive(Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl UreqTransport {
        pub fn new() -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();
            Self { agent }
        }

        /// Wrap a preconfigured agent, e.g. one with timeouts set.
        ///
        /// The agent must be built with `http_status_as_error(false)` so that
        /// 4xx/5xx responses reach the client's error mapping.
        pub fn with_agent(agent: ureq::Agent) -> Self {
            Self { agent }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl Transport for UreqTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let agent = self.agent.clone();
                    handle
                        .spawn_blocking(move || execute(&agent, request))
                        .await?
                }
                Err(_) => execute(&self.agent, request),
            }
        }
    }

    fn execute(agent: &ureq::Agent, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut response = match method {
            HttpMethod::Get | HttpMethod::Delete => {
                let mut builder = match method {
                    HttpMethod::Delete => agent.delete(&url),
                    _ => agent.get(&url),
                };
                for (name, value) in &headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()?
            }
            HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch => {
                let mut builder = match method {
                    HttpMethod::Put => agent.put(&url),
                    HttpMethod::Patch => agent.patch(&url),
                    _ => agent.post(&url),
                };
                for (name, value) in &headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match body {
                    Some(body) => builder.send(body.as_bytes())?,
                    None => builder.send_empty()?,
                }
            }
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.body_mut().read_to_string()?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
