//! Request/response interceptors
//!
//! An [`InterceptorChain`] wraps every call the client makes. On the way out
//! each interceptor sees the request produced by the one before it; on the
//! way back each sees the response produced by the one before it. Both
//! phases walk the list in the same order.
//!
//! Interceptors run synchronously and must not block. They can observe a
//! response and ask for a retry through [`Interceptor::signals_retry`], but
//! the decision and the re-send belong to the client's retry loop.

mod auth;
mod headers;
mod logging;
mod retry;
mod timeout;

use std::{fmt, sync::Arc};

use tracing::trace;

pub use auth::{AuthInjector, SharedToken, StaticToken, TokenProvider};
pub use headers::HeaderInjector;
pub use logging::RequestLogger;
pub use retry::RetrySignaler;
pub use timeout::TimeoutSetter;

use crate::request::{TransportRequest, TransportResponse};

/// Outcome of one interceptor step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transform<T> {
    /// Keep the value from the previous step
    Unchanged,
    /// Continue with this value instead
    Replace(T),
}

impl<T> Transform<T> {
    /// Resolve against the previous value
    pub fn apply(self, previous: T) -> T {
        match self {
            Transform::Unchanged => previous,
            Transform::Replace(next) => next,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, Transform::Unchanged)
    }
}

/// A composable request/response transformer
pub trait Interceptor: Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    fn intercept_request(&self, _request: &TransportRequest) -> Transform<TransportRequest> {
        Transform::Unchanged
    }

    fn intercept_response(&self, _response: &TransportResponse) -> Transform<TransportResponse> {
        Transform::Unchanged
    }

    /// Advisory: does this response deserve another attempt?
    fn signals_retry(&self, _response: &TransportResponse) -> bool {
        false
    }
}

/// Ordered, immutable list of interceptors
#[derive(Clone)]
pub struct InterceptorChain {
    interceptors: Arc<[Arc<dyn Interceptor>]>,
}

impl Default for InterceptorChain {
    fn default() -> Self {
        Self {
            interceptors: Arc::from(Vec::new()),
        }
    }
}

impl InterceptorChain {
    /// Chain that passes everything through
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> InterceptorChainBuilder {
        InterceptorChainBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    /// Run the request phase in list order
    pub fn apply_request(&self, request: TransportRequest) -> TransportRequest {
        self.interceptors.iter().fold(request, |current, interceptor| {
            let step = interceptor.intercept_request(&current);
            trace!(
                interceptor = interceptor.name(),
                changed = !step.is_unchanged(),
                "request phase"
            );
            step.apply(current)
        })
    }

    /// Run the response phase in list order
    pub fn apply_response(&self, response: TransportResponse) -> TransportResponse {
        self.interceptors.iter().fold(response, |current, interceptor| {
            let step = interceptor.intercept_response(&current);
            trace!(
                interceptor = interceptor.name(),
                changed = !step.is_unchanged(),
                "response phase"
            );
            step.apply(current)
        })
    }

    /// True if any interceptor asks for this response to be retried
    pub fn signals_retry(&self, response: &TransportResponse) -> bool {
        self.interceptors.iter().any(|i| i.signals_retry(response))
    }
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl FromIterator<Arc<dyn Interceptor>> for InterceptorChain {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Interceptor>>>(iter: I) -> Self {
        Self {
            interceptors: iter.into_iter().collect(),
        }
    }
}

/// Collects interceptors before freezing them into a chain
#[derive(Default)]
pub struct InterceptorChainBuilder {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChainBuilder {
    pub fn with(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn with_shared(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn build(self) -> InterceptorChain {
        self.interceptors.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;
    use crate::request::HttpMethod;

    /// Appends its tag to an `X-Trail` header and to the response body
    struct Tagger(&'static str);

    impl Interceptor for Tagger {
        fn name(&self) -> &str {
            self.0
        }

        fn intercept_request(&self, request: &TransportRequest) -> Transform<TransportRequest> {
            let mut next = request.clone();
            let trail = match next.headers.get("X-Trail") {
                Some(prev) => format!("{prev}{}", self.0),
                None => self.0.to_string(),
            };
            next.headers.insert("X-Trail", trail);
            Transform::Replace(next)
        }

        fn intercept_response(&self, response: &TransportResponse) -> Transform<TransportResponse> {
            let mut next = response.clone();
            next.body.extend_from_slice(self.0.as_bytes());
            Transform::Replace(next)
        }
    }

    struct Passive;

    impl Interceptor for Passive {
        fn name(&self) -> &str {
            "passive"
        }
    }

    fn request() -> TransportRequest {
        TransportRequest::new(HttpMethod::Get, Url::parse("https://example.com/").unwrap())
    }

    fn chain() -> InterceptorChain {
        InterceptorChain::builder()
            .with(Tagger("A"))
            .with(Tagger("B"))
            .with(Tagger("C"))
            .build()
    }

    #[test]
    fn test_request_phase_runs_in_list_order() {
        let out = chain().apply_request(request());
        assert_eq!(out.headers.get("X-Trail"), Some("ABC"));
    }

    #[test]
    fn test_response_phase_runs_in_list_order() {
        let out = chain().apply_response(TransportResponse::new(200, b"raw:".to_vec()));
        assert_eq!(out.body, b"raw:ABC".to_vec());
    }

    #[test]
    fn test_unchanged_keeps_previous_value() {
        let chain = InterceptorChain::builder()
            .with(Tagger("A"))
            .with(Passive)
            .with(Tagger("B"))
            .build();
        let out = chain.apply_request(request());
        assert_eq!(out.headers.get("X-Trail"), Some("AB"));

        let response = TransportResponse::new(204, Vec::new());
        let passive_only = InterceptorChain::builder().with(Passive).build();
        assert_eq!(passive_only.apply_response(response.clone()), response);
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let chain = InterceptorChain::empty();
        assert!(chain.is_empty());
        assert_eq!(chain.apply_request(request()), request());
        assert!(!chain.signals_retry(&TransportResponse::new(500, Vec::new())));
    }

    #[test]
    fn test_clones_share_interceptors() {
        let chain = chain();
        let clone = chain.clone();
        assert_eq!(clone.names(), vec!["A", "B", "C"]);
        assert_eq!(format!("{chain:?}"), r#"["A", "B", "C"]"#);
    }

    #[test]
    fn test_transform_apply() {
        assert_eq!(Transform::Unchanged.apply(1), 1);
        assert_eq!(Transform::Replace(2).apply(1), 2);
    }
}
