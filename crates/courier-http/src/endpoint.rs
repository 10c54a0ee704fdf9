//! Endpoint descriptors
//!
//! An [`EndpointDescriptor`] fully specifies one API call. Callers usually
//! model their API as a closed enum implementing [`Endpoint`], with one
//! variant per logical call, and hand that to the client.

use std::{borrow::Cow, collections::HashMap, fmt};

use serde::Serialize;
use url::Url;

use crate::{
    error::ClientError,
    multipart::MultipartSpec,
    request::{Headers, HttpMethod, TransportRequest},
    Result,
};

/// Anything that can describe a single API call
pub trait Endpoint {
    fn descriptor(&self) -> Result<EndpointDescriptor>;
}

impl Endpoint for EndpointDescriptor {
    fn descriptor(&self) -> Result<EndpointDescriptor> {
        Ok(self.clone())
    }
}

/// API version tag mapped to a path prefix, e.g. `v1` -> `/api/v1/`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiVersion(Option<Cow<'static, str>>);

impl ApiVersion {
    pub const V1: ApiVersion = ApiVersion(Some(Cow::Borrowed("v1")));
    pub const V2: ApiVersion = ApiVersion(Some(Cow::Borrowed("v2")));

    pub fn new(tag: impl Into<String>) -> Self {
        Self(Some(Cow::Owned(tag.into())))
    }

    /// No version segment at all
    pub fn unversioned() -> Self {
        Self(None)
    }

    pub fn tag(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Path prefix inserted between base URL and endpoint path
    pub fn prefix(&self) -> String {
        match &self.0 {
            Some(tag) => format!("/api/{tag}/"),
            None => String::new(),
        }
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::V1
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag().unwrap_or("unversioned"))
    }
}

/// Request payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// Raw bytes, sent as-is with no implied content type
    Bytes(Vec<u8>),
    /// Pre-serialized JSON
    Json(Vec<u8>),
    Multipart(MultipartSpec),
}

impl RequestBody {
    /// Serialize any value to a JSON body
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_vec(value)
            .map(RequestBody::Json)
            .map_err(|e| ClientError::RequestFailed(format!("Failed to encode JSON body: {e}")))
    }

    pub fn content_type(&self) -> Option<String> {
        match self {
            RequestBody::Bytes(_) => None,
            RequestBody::Json(_) => Some("application/json".to_string()),
            RequestBody::Multipart(spec) => Some(spec.content_type()),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            RequestBody::Bytes(bytes) | RequestBody::Json(bytes) => bytes.clone(),
            RequestBody::Multipart(spec) => spec.encode(),
        }
    }
}

/// Routing and payload for one API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub method: HttpMethod,
    pub path: String,
    pub base_url: String,
    pub api_version: ApiVersion,
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub body: Option<RequestBody>,
}

impl EndpointDescriptor {
    pub fn new(method: HttpMethod, base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            base_url: base_url.into(),
            api_version: ApiVersion::default(),
            headers: HashMap::new(),
            query: HashMap::new(),
            body: None,
        }
    }

    pub fn get(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, base_url, path)
    }

    pub fn post(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, base_url, path)
    }

    pub fn with_version(mut self, version: ApiVersion) -> Self {
        self.api_version = version;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add a query parameter using the value's `Display` form
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.insert(key.into(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn json_body<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        Ok(self.with_body(RequestBody::json(value)?))
    }

    pub fn multipart(self, spec: MultipartSpec) -> Self {
        self.with_body(RequestBody::Multipart(spec))
    }

    /// Build the absolute URL, including query parameters
    pub fn url(&self) -> Result<Url> {
        // Exactly one `/` on each side of the version prefix; unversioned
        // descriptors still need a separator between host and path.
        let base = self.base_url.trim_end_matches('/');
        let path = self.path.trim_start_matches('/');
        let mut prefix = self.api_version.prefix();
        if prefix.is_empty() {
            prefix.push('/');
        }
        let raw = format!("{base}{prefix}{path}");

        let mut url = Url::parse(&raw).map_err(|e| ClientError::InvalidUrl(format!("{raw}: {e}")))?;
        if !url.has_host() {
            return Err(ClientError::InvalidUrl(format!("{raw}: missing host")));
        }

        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }

    /// Produce a transport-ready request; fails before any I/O on a bad URL
    pub fn resolve(&self) -> Result<TransportRequest> {
        let url = self.url()?;
        let mut request = TransportRequest::new(self.method, url);
        request.headers = self
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<Headers>();

        if let Some(body) = &self.body {
            if let Some(content_type) = body.content_type() {
                request.headers.insert_if_absent("Content-Type", content_type);
            }
            request.body = body.to_bytes();
        }
        Ok(request)
    }
}
