//! Primary transport backed by reqwest

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{header::CONTENT_LENGTH, Body};
use tracing::debug;

use super::Transport;
use crate::{
    config::ClientConfig,
    error::ClientError,
    progress::ProgressReporter,
    request::{Headers, TransportRequest, TransportResponse},
    Result,
};

/// Upload granularity when a progress reporter is attached
const UPLOAD_CHUNK_SIZE: usize = 16 * 1024;

/// Async transport over a pooled `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Build the underlying client from configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .redirect(if config.max_redirects > 0 {
                reqwest::redirect::Policy::limited(config.max_redirects)
            } else {
                reqwest::redirect::Policy::none()
            });

        if let Some(proxy_url) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| ClientError::RequestFailed(format!("Invalid proxy configuration: {e}")))?;
            builder = builder.proxy(proxy);
        }

        if config.pool_enabled {
            builder = builder.pool_idle_timeout(config.pool_idle_timeout);
        } else {
            builder = builder.pool_max_idle_per_host(0);
        }

        let inner = builder
            .build()
            .map_err(|e| ClientError::RequestFailed(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { inner })
    }

    /// Wrap an existing client
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    /// Get underlying reqwest client (for advanced usage)
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }
}

/// Split the body into chunks that advance the reporter as hyper pulls them
fn progress_body(body: Vec<u8>, reporter: ProgressReporter) -> Body {
    let total = body.len() as u64;
    let chunks: Vec<Vec<u8>> = body.chunks(UPLOAD_CHUNK_SIZE).map(<[u8]>::to_vec).collect();
    let mut sent = 0u64;

    let stream = futures::stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        reporter.report_bytes(sent, total);
        Ok::<_, std::io::Error>(chunk)
    });
    Body::wrap_stream(stream)
}

#[async_trait]
impl Transport for ReqwestTransport {
    fn name(&self) -> &str {
        "reqwest"
    }

    async fn send(
        &self,
        request: TransportRequest,
        progress: Option<ProgressReporter>,
    ) -> Result<TransportResponse> {
        let TransportRequest {
            method,
            url,
            headers,
            body,
            timeout,
        } = request;
        debug!("HTTP {}: {}", method, url);

        let mut builder = self.inner.request(method.into(), url);
        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        if !body.is_empty() {
            builder = match &progress {
                Some(reporter) => {
                    reporter.report(0.0);
                    builder
                        .header(CONTENT_LENGTH, body.len())
                        .body(progress_body(body, reporter.clone()))
                }
                None => builder.body(body),
            };
        }

        let response = builder.send().await.map_err(ClientError::from)?;

        let status = response.status().as_u16();
        let mut response_headers = Headers::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                response_headers.append(name.as_str(), value);
            }
        }
        let body = response.bytes().await.map_err(ClientError::from)?.to_vec();

        if let Some(reporter) = &progress {
            reporter.complete();
        }
        debug!(status, body_length = body.len(), "HTTP exchange finished");

        Ok(TransportResponse {
            status,
            headers: response_headers,
            body,
        })
    }
}
