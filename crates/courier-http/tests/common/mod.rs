//! Scripted in-memory transport shared by the integration suites

#![allow(dead_code)]

use std::{collections::VecDeque, time::Duration};

use async_trait::async_trait;
use courier_http::{
    ClientError, ProgressReporter, Result, Transport, TransportRequest, TransportResponse,
};
use parking_lot::Mutex;

/// Replays queued outcomes in order and records every request it sees
pub struct StubTransport {
    name: &'static str,
    outcomes: Mutex<VecDeque<Result<TransportResponse>>>,
    requests: Mutex<Vec<TransportRequest>>,
    delay: Option<Duration>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::named("stub")
    }

    pub fn named(name: &'static str) -> Self {
        Self {
            name,
            outcomes: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn respond(self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.outcomes
            .lock()
            .push_back(Ok(TransportResponse::new(status, body)));
        self
    }

    pub fn respond_with(self, response: TransportResponse) -> Self {
        self.outcomes.lock().push_back(Ok(response));
        self
    }

    pub fn fail(self, error: ClientError) -> Self {
        self.outcomes.lock().push_back(Err(error));
        self
    }

    /// Sleep before answering, to exercise cancellation
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Transport for StubTransport {
    fn name(&self) -> &str {
        self.name
    }

    async fn send(
        &self,
        request: TransportRequest,
        progress: Option<ProgressReporter>,
    ) -> Result<TransportResponse> {
        let total = request.body.len() as u64;
        self.requests.lock().push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = self
            .outcomes
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::RequestFailed("stub exhausted".to_string())));

        if let (Some(reporter), Ok(_)) = (&progress, &outcome) {
            reporter.report_bytes(total / 2, total);
            reporter.complete();
        }
        outcome
    }
}
