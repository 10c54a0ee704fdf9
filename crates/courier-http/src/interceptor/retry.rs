//! Server-error retry signalling

use std::ops::RangeInclusive;

use tracing::debug;

use super::Interceptor;
use crate::request::TransportResponse;

/// Flags responses whose status falls in a retryable range (5xx by default).
///
/// It never sleeps or re-sends; the client's retry loop acts on the signal
/// according to its [`RetryPolicy`](crate::RetryPolicy).
#[derive(Debug, Clone)]
pub struct RetrySignaler {
    statuses: RangeInclusive<u16>,
}

impl Default for RetrySignaler {
    fn default() -> Self {
        Self {
            statuses: 500..=599,
        }
    }
}

impl RetrySignaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statuses(statuses: RangeInclusive<u16>) -> Self {
        Self { statuses }
    }
}

impl Interceptor for RetrySignaler {
    fn name(&self) -> &str {
        "retry"
    }

    fn signals_retry(&self, response: &TransportResponse) -> bool {
        let retry = self.statuses.contains(&response.status);
        if retry {
            debug!(status = response.status, "Retry requested for server error");
        }
        retry
    }
}
