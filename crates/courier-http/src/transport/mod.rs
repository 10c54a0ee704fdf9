//! Network backends
//!
//! The client only depends on [`Transport`]. Two backends ship with the
//! crate: [`ReqwestTransport`] (async, reports byte-level upload progress)
//! and [`UreqTransport`] (a blocking client driven from tokio's blocking
//! pool). Tests and embedders can plug in their own.

mod reqwest_transport;
mod ureq_transport;

use async_trait::async_trait;

pub use reqwest_transport::ReqwestTransport;
pub use ureq_transport::UreqTransport;

use crate::{
    progress::ProgressReporter,
    request::{TransportRequest, TransportResponse},
    Result,
};

/// Executes one HTTP exchange.
///
/// Implementations must return non-2xx responses as `Ok`; status
/// validation belongs to the client. Failures are mapped into
/// [`ClientError`](crate::ClientError).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    /// Send the request. When `progress` is present it must reach 1.0 once
    /// the exchange completes successfully.
    async fn send(
        &self,
        request: TransportRequest,
        progress: Option<ProgressReporter>,
    ) -> Result<TransportResponse>;
}
