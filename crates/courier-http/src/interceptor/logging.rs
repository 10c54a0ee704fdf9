//! Debug-build request/response diagnostics

use tracing::debug;

use super::{Interceptor, Transform};
use crate::request::{TransportRequest, TransportResponse};

/// Emits `tracing` events for every request and response.
///
/// Never alters either value. Silent in release builds unless forced on.
#[derive(Debug, Clone, Copy)]
pub struct RequestLogger {
    enabled: bool,
}

impl Default for RequestLogger {
    fn default() -> Self {
        Self {
            enabled: cfg!(debug_assertions),
        }
    }
}

impl RequestLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log regardless of build profile
    pub fn always() -> Self {
        Self { enabled: true }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Interceptor for RequestLogger {
    fn name(&self) -> &str {
        "logger"
    }

    fn intercept_request(&self, request: &TransportRequest) -> Transform<TransportRequest> {
        if self.enabled {
            let headers: Vec<String> = request
                .headers
                .iter()
                .map(|(name, value)| {
                    if name.eq_ignore_ascii_case("authorization") {
                        format!("{name}: <redacted>")
                    } else {
                        format!("{name}: {value}")
                    }
                })
                .collect();
            debug!(
                method = %request.method,
                url = %request.url,
                headers = ?headers,
                body_length = request.body.len(),
                "HTTP request"
            );
        }
        Transform::Unchanged
    }

    fn intercept_response(&self, response: &TransportResponse) -> Transform<TransportResponse> {
        if self.enabled {
            debug!(
                status = response.status,
                body_length = response.body.len(),
                body_preview = %response.body_preview(),
                "HTTP response"
            );
        }
        Transform::Unchanged
    }
}
