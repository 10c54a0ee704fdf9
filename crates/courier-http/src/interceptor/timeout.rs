//! Per-request timeout configuration

use std::time::Duration;

use super::{Interceptor, Transform};
use crate::request::TransportRequest;

/// Stamps a timeout on each request for the transport to enforce.
///
/// Headers and body are left alone. A later `TimeoutSetter` in the chain
/// wins over an earlier one.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutSetter {
    timeout: Duration,
}

impl TimeoutSetter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Interceptor for TimeoutSetter {
    fn name(&self) -> &str {
        "timeout"
    }

    fn intercept_request(&self, request: &TransportRequest) -> Transform<TransportRequest> {
        if request.timeout == Some(self.timeout) {
            return Transform::Unchanged;
        }
        let mut next = request.clone();
        next.timeout = Some(self.timeout);
        Transform::Replace(next)
    }
}
