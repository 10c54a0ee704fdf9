//! Fixed header injection

use super::{Interceptor, Transform};
use crate::request::{Headers, TransportRequest};

/// Adds fixed headers to every request without overwriting existing ones
#[derive(Debug, Clone, Default)]
pub struct HeaderInjector {
    headers: Headers,
}

impl HeaderInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }
}

impl Interceptor for HeaderInjector {
    fn name(&self) -> &str {
        "headers"
    }

    fn intercept_request(&self, request: &TransportRequest) -> Transform<TransportRequest> {
        let mut next = request.clone();
        let mut added = false;
        for (name, value) in self.headers.iter() {
            added |= next.headers.insert_if_absent(name, value);
        }
        if added {
            Transform::Replace(next)
        } else {
            Transform::Unchanged
        }
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;
    use crate::request::HttpMethod;

    fn request() -> TransportRequest {
        TransportRequest::new(HttpMethod::Get, Url::parse("https://example.com/").unwrap())
    }

    #[test]
    fn test_adds_missing_headers() {
        let injector = HeaderInjector::new()
            .with("Accept", "application/json")
            .with("X-Client", "courier");
        let out = injector.intercept_request(&request()).apply(request());
        assert_eq!(out.headers.get("accept"), Some("application/json"));
        assert_eq!(out.headers.get("x-client"), Some("courier"));
    }

    #[test]
    fn test_never_overwrites_existing_headers() {
        let mut original = request();
        original.headers.insert("accept", "text/plain");

        let injector = HeaderInjector::new().with("Accept", "application/json");
        let step = injector.intercept_request(&original);
        assert!(step.is_unchanged());
        assert_eq!(step.apply(original).headers.get("Accept"), Some("text/plain"));
    }
}
