//! Transport-agnostic HTTP client for Courier
//!
//! Describe each API call as an [`EndpointDescriptor`] (usually produced by
//! a caller-defined enum implementing [`Endpoint`]), wrap calls in an
//! [`InterceptorChain`], and let [`HttpClient`] run the pipeline.
//!
//! ## Features
//!
//! - **Endpoint descriptors**: method, versioned path, headers, query, body
//! - **Body encoding**: JSON and byte-exact multipart/form-data
//! - **Interceptors**: auth, logging, retry signalling, timeouts, headers
//! - **Retry loop**: async exponential backoff owned by the client
//! - **Pluggable transports**: reqwest (primary) and ureq (alternate)
//! - **Upload progress**: monotonic fractional callbacks
//! - **Testing support**: mock any backend via the `Transport` trait

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod interceptor;
pub mod middleware;
pub mod multipart;
pub mod progress;
pub mod request;
pub mod transport;

pub use client::{HttpClient, HttpClientBuilder};
pub use config::ClientConfig;
pub use endpoint::{ApiVersion, Endpoint, EndpointDescriptor, RequestBody};
pub use error::{ClientError, Result};
pub use interceptor::{
    AuthInjector, HeaderInjector, Interceptor, InterceptorChain, RequestLogger, RetrySignaler,
    SharedToken, StaticToken, TimeoutSetter, TokenProvider, Transform,
};
pub use middleware::{RetryMiddleware, RetryPolicy};
pub use multipart::MultipartSpec;
pub use progress::{ProgressDelegate, ProgressReporter};
pub use request::{Headers, HttpMethod, TransportRequest, TransportResponse};
pub use transport::{ReqwestTransport, Transport, UreqTransport};

/// Re-export for callers wiring cancellation
pub use tokio_util::sync::CancellationToken;
