//! Client configuration.

use std::fmt;
use std::sync::Arc;

use crate::transport::Transport;

/// Base URL used when no endpoint is configured.
pub const DEFAULT_ENDPOINT: &str = "https://diamiq.com/api/sdk/v1";

/// Settings for `Client::new`.
///
/// `transport: None` means "use the built-in transport"; construction fails
/// if none was compiled in.
#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub debug: bool,
    pub transport: Option<Arc<dyn Transport>>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            debug: false,
            transport: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("debug", &self.debug)
            .field("transport", &self.transport.as_ref().map(|_| "<custom>"))
            .finish()
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// - `DIAMIQ_API_KEY`: API key
    /// - `DIAMIQ_ENDPOINT`: base URL
    /// - `DIAMIQ_DEBUG`: any value other than `0`, `false` or empty enables debug logging
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(key) = std::env::var("DIAMIQ_API_KEY") {
            if !key.is_empty() {
                config.api_key = Some(key);
            }
        }

        if let Ok(endpoint) = std::env::var("DIAMIQ_ENDPOINT") {
            config.endpoint = endpoint;
        }

        if let Ok(debug) = std::env::var("DIAMIQ_DEBUG") {
            config.debug = !matches!(debug.trim(), "" | "0" | "false");
        }

        config
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        let transport: Arc<dyn Transport> = Arc::new(transport);
        self.transport = Some(transport);
        self
    }

    /// Share one transport between several clients.
    pub fn with_shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }
}
