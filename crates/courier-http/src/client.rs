//! HTTP client facade
//!
//! # Design
//! `HttpClient` holds only immutable state: a primary transport, an optional
//! alternate transport, the interceptor chain and the retry policy. It is
//! cheap to clone and safe to share between concurrent callers.
//!
//! Every operation runs the same pipeline:
//! descriptor -> resolve -> chain (request) -> transport -> chain (response)
//! -> retry decision -> status check -> decode.

use std::{future::Future, sync::Arc};

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::{
    config::ClientConfig,
    endpoint::Endpoint,
    error::{ClientError, Result},
    interceptor::InterceptorChain,
    middleware::{AttemptError, RetryMiddleware, RetryPolicy},
    progress::{ProgressDelegate, ProgressReporter},
    request::TransportResponse,
    transport::{ReqwestTransport, Transport, UreqTransport},
};

/// Transport-agnostic client facade
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    alternate: Option<Arc<dyn Transport>>,
    chain: InterceptorChain,
    retry: RetryMiddleware,
}

impl HttpClient {
    /// Create a client with the reqwest primary and ureq alternate backends
    pub fn new(config: ClientConfig, chain: InterceptorChain) -> Result<Self> {
        Self::builder()
            .transport(Arc::new(ReqwestTransport::new(&config)?))
            .alternate_transport(Arc::new(UreqTransport::new(&config)?))
            .interceptors(chain)
            .retry_policy(config.retry.clone())
            .build()
    }

    /// Create a client with default configuration and no interceptors
    pub fn with_defaults() -> Result<Self> {
        Self::new(ClientConfig::default(), InterceptorChain::empty())
    }

    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn interceptors(&self) -> &InterceptorChain {
        &self.chain
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        self.retry.policy()
    }

    /// Send the request and decode a 2xx JSON body into `T`.
    ///
    /// The body is always parsed, so an empty 2xx body (e.g. `204 No
    /// Content`) fails with `DecodingFailed` even for `T = ()`. Use
    /// [`request_void`](Self::request_void) for calls that return no body.
    pub async fn request_decoded<T, E>(&self, endpoint: &E) -> Result<T>
    where
        T: DeserializeOwned,
        E: Endpoint + ?Sized,
    {
        let response = self.execute(self.transport.as_ref(), endpoint, None).await?;
        decode(&response)
    }

    /// Send the request and discard the body
    pub async fn request_void<E>(&self, endpoint: &E) -> Result<()>
    where
        E: Endpoint + ?Sized,
    {
        self.execute(self.transport.as_ref(), endpoint, None).await?;
        Ok(())
    }

    /// Send the request, reporting upload progress, and return the raw body.
    ///
    /// `Ok(None)` means a successful response without a body.
    pub async fn request_with_progress<E>(
        &self,
        endpoint: &E,
        progress: Option<Arc<dyn ProgressDelegate>>,
    ) -> Result<Option<Vec<u8>>>
    where
        E: Endpoint + ?Sized,
    {
        let reporter = progress.map(ProgressReporter::new);
        let response = self
            .execute(self.transport.as_ref(), endpoint, reporter)
            .await?;
        if response.body.is_empty() {
            Ok(None)
        } else {
            Ok(Some(response.body))
        }
    }

    /// Same contract as [`request_decoded`](Self::request_decoded), routed
    /// through the alternate transport
    pub async fn request_decoded_alternate<T, E>(&self, endpoint: &E) -> Result<T>
    where
        T: DeserializeOwned,
        E: Endpoint + ?Sized,
    {
        let transport = self
            .alternate
            .as_deref()
            .ok_or_else(|| ClientError::RequestFailed("No alternate transport configured".to_string()))?;
        let response = self.execute(transport, endpoint, None).await?;
        decode(&response)
    }

    /// Race `request` against `token`, failing with `Cancelled` if it fires.
    ///
    /// The losing request future is dropped, which aborts the transport call.
    pub async fn cancellable<T, F>(token: &CancellationToken, request: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("Request cancelled by caller");
                Err(ClientError::Cancelled)
            }
            result = request => result,
        }
    }

    #[instrument(name = "http_execute", skip_all, fields(transport = transport.name()))]
    async fn execute<E>(
        &self,
        transport: &dyn Transport,
        endpoint: &E,
        progress: Option<ProgressReporter>,
    ) -> Result<TransportResponse>
    where
        E: Endpoint + ?Sized,
    {
        let descriptor = endpoint.descriptor()?;

        self.retry
            .execute(|attempt| {
                let descriptor = &descriptor;
                let progress = progress.clone();
                async move {
                    let request = descriptor.resolve().map_err(AttemptError::fatal)?;
                    let request = self.chain.apply_request(request);
                    debug!(attempt, method = %request.method, url = %request.url, "Sending request");

                    let response = transport.send(request, progress).await?;
                    let response = self.chain.apply_response(response);

                    if response.is_success() {
                        return Ok(response);
                    }

                    let error = ClientError::StatusCode(response.status);
                    if self.chain.signals_retry(&response) {
                        Err(AttemptError::retryable(error))
                    } else {
                        Err(AttemptError::fatal(error))
                    }
                }
            })
            .await
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("transport", &self.transport.name())
            .field("alternate", &self.alternate.as_ref().map(|t| t.name()))
            .field("chain", &self.chain)
            .field("retry", self.retry.policy())
            .finish()
    }
}

fn decode<T: DeserializeOwned>(response: &TransportResponse) -> Result<T> {
    serde_json::from_slice(&response.body).map_err(|e| ClientError::DecodingFailed(e.to_string()))
}

/// Assembles an [`HttpClient`] from arbitrary transports
#[derive(Default)]
pub struct HttpClientBuilder {
    transport: Option<Arc<dyn Transport>>,
    alternate: Option<Arc<dyn Transport>>,
    chain: InterceptorChain,
    retry: RetryPolicy,
}

impl HttpClientBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn alternate_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.alternate = Some(transport);
        self
    }

    pub fn interceptors(mut self, chain: InterceptorChain) -> Self {
        self.chain = chain;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let transport = self
            .transport
            .ok_or_else(|| ClientError::RequestFailed("No transport configured".to_string()))?;
        Ok(HttpClient {
            transport,
            alternate: self.alternate,
            chain: self.chain,
            retry: RetryMiddleware::new(self.retry),
        })
    }
}
