//! Async client for the Diamiq document-generation API.
//!
//! # Overview
//! Wraps the REST API's token check, template discovery, placeholder lookup
//! and document generation, plus a client-side check of a payload's keys
//! against a template's placeholder schema.
//!
//! # Design
//! - `Client` holds configuration and an injected `Transport`; every
//!   operation is a single round-trip through one shared request routine.
//! - Requests and responses are plain data (`HttpRequest`, `HttpResponse`),
//!   so hosts can also drive `Client::build_request` /
//!   `Client::parse_response` with their own I/O.
//! - Responses the client does not inspect stay `serde_json::Value`;
//!   placeholders and generation results are typed.
//!
//! ```no_run
//! use diamiq_client::{Client, ClientConfig, GenerateOptions, OutputFormat};
//! use serde_json::json;
//!
//! # async fn example() -> diamiq_client::Result<()> {
//! let client = Client::new(ClientConfig::new().with_api_key("sk_live_..."))?;
//! let data = json!({"name": "Ada"});
//! client.validate_payload("tpl_1", &data, None).await?;
//! let doc = client
//!     .generate("tpl_1", &data, &GenerateOptions::new().output(OutputFormat::Pdf))
//!     .await?;
//! if let Some(doc) = doc {
//!     println!("{}", doc.url);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;
pub mod validation;

pub use client::Client;
pub use config::{ClientConfig, DEFAULT_ENDPOINT};
pub use error::{ApiError, Error, Result, PAYLOAD_INVALID, UNKNOWN_ERROR};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{default_transport, Transport, TransportError};
#[cfg(feature = "ureq-transport")]
pub use transport::UreqTransport;
pub use types::{
    GenerateOptions, GenerationResult, OutputFormat, Placeholder, PlaceholderList, TemplateFilters,
};
pub use validation::{check_payload, PayloadReport};
