//! Bearer token injection

use std::sync::Arc;

use parking_lot::RwLock;

use super::{Interceptor, Transform};
use crate::request::TransportRequest;

/// Supplies the current access token, if any.
///
/// Called on every request from arbitrary tasks; implementations must return
/// promptly and never wait on I/O.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

impl<F> TokenProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

/// Token fixed at construction
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenProvider for StaticToken {
    fn token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Token slot that can be rotated or cleared while requests are in flight
#[derive(Debug, Clone, Default)]
pub struct SharedToken {
    inner: Arc<RwLock<Option<String>>>,
}

impl SharedToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.inner.write() = Some(token.into());
    }

    pub fn clear(&self) {
        *self.inner.write() = None;
    }
}

impl TokenProvider for SharedToken {
    fn token(&self) -> Option<String> {
        self.inner.read().clone()
    }
}

/// Adds `Authorization: Bearer <token>` when a token is available
pub struct AuthInjector {
    provider: Arc<dyn TokenProvider>,
}

impl AuthInjector {
    pub fn new(provider: impl TokenProvider + 'static) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }
}

impl Interceptor for AuthInjector {
    fn name(&self) -> &str {
        "auth"
    }

    fn intercept_request(&self, request: &TransportRequest) -> Transform<TransportRequest> {
        match self.provider.token() {
            Some(token) => {
                let mut next = request.clone();
                next.headers.insert("Authorization", format!("Bearer {token}"));
                Transform::Replace(next)
            }
            None => Transform::Unchanged,
        }
    }
}
