//! Alternate transport backed by the blocking ureq agent
//!
//! Each exchange runs on tokio's blocking pool so the async caller is never
//! parked. ureq exposes no upload hook, so progress jumps from 0.0 to 1.0.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use super::Transport;
use crate::{
    config::ClientConfig,
    error::ClientError,
    progress::ProgressReporter,
    request::{Headers, TransportRequest, TransportResponse},
    Result,
};

/// Secondary backend over `ureq::Agent`
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    config: ClientConfig,
    // One agent (and pool) per distinct timeout override, shared by clones
    overrides: Arc<Mutex<HashMap<Duration, ureq::Agent>>>,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            agent: build_agent(config, config.timeout)?,
            config: config.clone(),
            overrides: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Agent honouring a per-request timeout override
    fn agent_for(&self, timeout: Option<Duration>) -> Result<ureq::Agent> {
        let timeout = match timeout {
            Some(timeout) if timeout != self.config.timeout => timeout,
            _ => return Ok(self.agent.clone()),
        };

        let mut overrides = self.overrides.lock();
        if let Some(agent) = overrides.get(&timeout) {
            return Ok(agent.clone());
        }
        let agent = build_agent(&self.config, timeout)?;
        overrides.insert(timeout, agent.clone());
        Ok(agent)
    }
}

fn build_agent(config: &ClientConfig, timeout: Duration) -> Result<ureq::Agent> {
    let proxy = match &config.proxy {
        Some(url) => Some(ureq::Proxy::new(url).map_err(|e| {
            ClientError::RequestFailed(format!("Invalid proxy configuration: {e}"))
        })?),
        None => None,
    };

    // Non-2xx statuses and unfollowed redirects come back as responses so the
    // client can validate them like any other backend.
    Ok(ureq::Agent::config_builder()
        .http_status_as_error(false)
        .max_redirects(config.max_redirects as u32)
        .max_redirects_will_error(false)
        .timeout_global(Some(timeout))
        .timeout_connect(Some(config.connect_timeout))
        .proxy(proxy)
        .build()
        .new_agent())
}

/// Blocking half of [`UreqTransport::send`]
fn execute(agent: &ureq::Agent, request: TransportRequest, user_agent: &str) -> Result<TransportResponse> {
    let mut builder = ureq::http::Request::builder()
        .method(request.method.as_str())
        .uri(request.url.as_str());
    for (name, value) in request.headers.iter() {
        builder = builder.header(name, value);
    }
    if !request.headers.contains("User-Agent") {
        builder = builder.header("User-Agent", user_agent);
    }

    let invalid = |e: ureq::http::Error| ClientError::RequestFailed(format!("Invalid request: {e}"));
    let mut response = if request.body.is_empty() {
        agent.run(builder.body(()).map_err(invalid)?)?
    } else {
        agent.run(builder.body(request.body).map_err(invalid)?)?
    };

    let status = response.status().as_u16();
    let mut headers = Headers::new();
    for (name, value) in response.headers() {
        if let Ok(value) = value.to_str() {
            headers.append(name.as_str(), value);
        }
    }
    let body = response.body_mut().read_to_vec()?;

    Ok(TransportResponse {
        status,
        headers,
        body,
    })
}

#[async_trait]
impl Transport for UreqTransport {
    fn name(&self) -> &str {
        "ureq"
    }

    async fn send(
        &self,
        request: TransportRequest,
        progress: Option<ProgressReporter>,
    ) -> Result<TransportResponse> {
        debug!("HTTP {} (ureq): {}", request.method, request.url);
        let agent = self.agent_for(request.timeout)?;
        let user_agent = self.config.user_agent.clone();

        if let Some(reporter) = &progress {
            reporter.report(0.0);
        }

        let response = tokio::task::spawn_blocking(move || execute(&agent, request, &user_agent))
            .await
            .map_err(|e| ClientError::RequestFailed(format!("Blocking transport task failed: {e}")))??;

        if let Some(reporter) = &progress {
            reporter.complete();
        }
        debug!(status = response.status, "HTTP exchange finished (ureq)");
        Ok(response)
    }
}
