//! forge::transport
//!
//! The HTTP transport collaborator and the adapter-side request helper.
//!
//! # Design
//!
//! [`Transport`] is the only seam that touches the network. It receives a
//! provider-shaped [`Request`] with a path relative to the configured base
//! URL and returns the raw status, headers, and body without interpreting
//! them. [`HttpTransport`] implements it with `reqwest`; tests substitute
//! [`MockTransport`](super::mock::MockTransport).
//!
//! Adapters never call the transport directly. They go through [`Api`],
//! which:
//! - refuses to send on a cancelled [`Context`] and aborts in-flight calls
//! - classifies every non-2xx status into an [`ScmError`]
//! - extracts rate-limit counters
//! - decodes JSON bodies into the adapter's wire structures

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use super::context::Context;
use super::traits::{Rate, Response, ScmError};
use crate::core::config::{ClientConfig, Credentials};

/// HTTP method of a provider request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// A provider request, relative to the client's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    /// Path without a leading slash, e.g. `rest/api/1.0/repos`
    pub path: String,
    /// Unencoded query pairs, in insertion order
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    /// Overrides the default `Accept` header
    pub accept: Option<String>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            method,
            path: path.trim_start_matches('/').to_string(),
            query: Vec::new(),
            body: None,
            accept: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a query pair only when a value is present.
    pub fn query_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    /// Attach a JSON body. Serialisation of wire structs cannot fail, so a
    /// failure here leaves the body empty rather than panicking.
    pub fn json<T: serde::Serialize>(mut self, body: &T) -> Self {
        self.body = serde_json::to_value(body).ok();
        self
    }

    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Look up a query value by key.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw transport response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// Header names are lowercased
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The transport collaborator.
///
/// Implementations return `Ok` for every HTTP response regardless of
/// status; only failures to obtain a response at all are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<RawResponse, ScmError>;
}

/// User-Agent header value when the config does not set one.
pub const DEFAULT_USER_AGENT: &str = concat!("scmbridge/", env!("CARGO_PKG_VERSION"));

/// `reqwest`-backed transport bound to one base URL and credential set.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    credentials: Credentials,
    user_agent: String,
}

// Custom Debug to avoid exposing credentials
impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: config.credentials.clone(),
            user_agent: config
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn headers(&self, accept: Option<&str>) -> Result<HeaderMap, ScmError> {
        let mut headers = HeaderMap::new();
        let accept = accept.unwrap_or("application/json");
        headers.insert(
            ACCEPT,
            HeaderValue::from_str(accept)
                .map_err(|_| ScmError::transport(format!("invalid accept header '{}'", accept)))?,
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );
        Ok(headers)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<RawResponse, ScmError> {
        let url = self.url(&request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .client
            .request(method, &url)
            .headers(self.headers(request.accept.as_deref())?);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder = match &self.credentials {
            Credentials::Anonymous => builder,
            Credentials::Token(token) => builder.bearer_auth(token),
            Credentials::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ScmError::transport(format!("request to {} failed: {}", url, e)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| ScmError::Transport {
                status: Some(status),
                message: format!("failed to read response body: {}", e),
            })?
            .to_vec();

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

// --------------------------------------------------------------------------
// Adapter-side helper
// --------------------------------------------------------------------------

/// Extracts a human-readable message from a provider error body.
pub type ErrorMessageFn = fn(&[u8]) -> Option<String>;

/// Request helper shared by the adapters.
#[derive(Clone)]
pub struct Api {
    transport: Arc<dyn Transport>,
    provider: &'static str,
    error_message: ErrorMessageFn,
}

impl std::fmt::Debug for Api {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Api")
            .field("provider", &self.provider)
            .finish()
    }
}

impl Api {
    pub fn new(
        transport: Arc<dyn Transport>,
        provider: &'static str,
        error_message: ErrorMessageFn,
    ) -> Self {
        Self {
            transport,
            provider,
            error_message,
        }
    }

    /// Send a request and classify the outcome.
    ///
    /// Returns the raw response for 2xx statuses; every other status becomes
    /// a classified [`ScmError`].
    pub async fn send(
        &self,
        ctx: &Context,
        request: Request,
    ) -> Result<(RawResponse, Response), ScmError> {
        debug!(
            provider = self.provider,
            method = %request.method,
            path = %request.path,
            "sending request"
        );
        let raw = ctx.run(self.transport.send(request)).await?;
        trace!(provider = self.provider, status = raw.status, "received response");

        if !raw.is_success() {
            let message = (self.error_message)(&raw.body);
            let err = classify(&raw, message);
            debug!(provider = self.provider, status = raw.status, error = %err, "request failed");
            return Err(err);
        }

        let response = Response {
            status: raw.status,
            rate: rate_from_headers(&raw),
            page: Default::default(),
        };
        Ok((raw, response))
    }

    /// Send a request and decode its JSON body.
    pub async fn json<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        request: Request,
    ) -> Result<(T, Response), ScmError> {
        let (raw, response) = self.send(ctx, request).await?;
        let value = decode(&raw)?;
        Ok((value, response))
    }

    /// Send a request whose response body is ignored.
    pub async fn empty(&self, ctx: &Context, request: Request) -> Result<((), Response), ScmError> {
        let (_, response) = self.send(ctx, request).await?;
        Ok(((), response))
    }
}

/// Decode a JSON body, reporting failures as transport errors.
pub fn decode<T: DeserializeOwned>(raw: &RawResponse) -> Result<T, ScmError> {
    serde_json::from_slice(&raw.body).map_err(|e| ScmError::Transport {
        status: Some(raw.status),
        message: format!("failed to decode response: {}", e),
    })
}

/// Classify a non-2xx response.
///
/// A 403 that reports an exhausted rate-limit quota is a rate-limit error,
/// not a permission denial.
pub fn classify(raw: &RawResponse, message: Option<String>) -> ScmError {
    let status = raw.status;
    let quota_exhausted = raw.header("x-ratelimit-remaining") == Some("0");

    match status {
        401 => ScmError::PermissionDenied {
            status,
            message: message.unwrap_or_else(|| "authentication required".into()),
        },
        403 if quota_exhausted => ScmError::RateLimited {
            status,
            message: message.unwrap_or_else(|| "rate limit exceeded".into()),
        },
        403 => ScmError::PermissionDenied {
            status,
            message: message.unwrap_or_else(|| "permission denied".into()),
        },
        404 => ScmError::NotFound {
            status,
            message: message.unwrap_or_else(|| "resource not found".into()),
        },
        400 | 409 | 422 => ScmError::ValidationFailed {
            status,
            message: message.unwrap_or_else(|| "request validation failed".into()),
        },
        429 => ScmError::RateLimited {
            status,
            message: message.unwrap_or_else(|| "rate limit exceeded".into()),
        },
        _ => ScmError::Transport {
            status: Some(status),
            message: message.unwrap_or_else(|| format!("unexpected status {}", status)),
        },
    }
}

/// Read `X-RateLimit-*` counters when the provider sends them.
pub fn rate_from_headers(raw: &RawResponse) -> Option<Rate> {
    let read = |name: &str| raw.header(name).and_then(|v| v.trim().parse::<u64>().ok());
    let limit = read("x-ratelimit-limit")?;
    Some(Rate {
        limit,
        remaining: read("x-ratelimit-remaining").unwrap_or(0),
        reset: read("x-ratelimit-reset").unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(status: u16, headers: &[(&str, &str)]) -> RawResponse {
        RawResponse {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: Vec::new(),
        }
    }

    mod classify {
        use super::*;

        #[test]
        fn maps_statuses_to_kinds() {
            use crate::forge::ErrorKind;

            let cases = [
                (400, ErrorKind::ValidationFailed),
                (401, ErrorKind::PermissionDenied),
                (403, ErrorKind::PermissionDenied),
                (404, ErrorKind::NotFound),
                (409, ErrorKind::ValidationFailed),
                (422, ErrorKind::ValidationFailed),
                (429, ErrorKind::RateLimited),
                (500, ErrorKind::Transport),
                (502, ErrorKind::Transport),
                (302, ErrorKind::Transport),
            ];
            for (status, kind) in cases {
                assert_eq!(classify(&raw(status, &[]), None).kind(), kind, "{}", status);
            }
        }

        #[test]
        fn exhausted_quota_is_rate_limited() {
            let err = classify(&raw(403, &[("x-ratelimit-remaining", "0")]), None);
            assert!(matches!(err, ScmError::RateLimited { status: 403, .. }));
        }

        #[test]
        fn provider_message_is_kept() {
            let err = classify(&raw(404, &[]), Some("Project dev does not exist.".into()));
            assert_eq!(
                err,
                ScmError::NotFound {
                    status: 404,
                    message: "Project dev does not exist.".into()
                }
            );
        }

        #[test]
        fn generic_message_without_body() {
            let err = classify(&raw(500, &[]), None);
            assert_eq!(err.to_string(), "transport error: unexpected status 500");
            assert_eq!(err.status(), Some(500));
        }
    }

    #[test]
    fn rate_headers_are_optional() {
        assert_eq!(rate_from_headers(&raw(200, &[])), None);
        assert_eq!(
            rate_from_headers(&raw(
                200,
                &[
                    ("x-ratelimit-limit", "5000"),
                    ("x-ratelimit-remaining", "4999"),
                    ("x-ratelimit-reset", "1372700873"),
                ]
            )),
            Some(Rate {
                limit: 5000,
                remaining: 4999,
                reset: 1372700873
            })
        );
    }

    #[test]
    fn header_lookup_ignores_case() {
        let r = raw(200, &[("link", "<x>; rel=\"next\"")]);
        assert_eq!(r.header("Link"), Some("<x>; rel=\"next\""));
    }

    #[test]
    fn request_builder_strips_leading_slash() {
        let req = Request::get("/rest/api/1.0/repos")
            .query("limit", 25)
            .query_opt("start", None::<u32>);
        assert_eq!(req.path, "rest/api/1.0/repos");
        assert_eq!(req.query_value("limit"), Some("25"));
        assert_eq!(req.query_value("start"), None);
    }

    #[test]
    fn decode_failure_is_transport_error() {
        let r = RawResponse {
            status: 200,
            headers: vec![],
            body: b"not json".to_vec(),
        };
        let err = decode::<serde_json::Value>(&r).unwrap_err();
        assert!(matches!(err, ScmError::Transport { status: Some(200), .. }));
    }

    #[test]
    fn http_transport_debug_redacts_token() {
        let config = ClientConfig::new(
            crate::forge::ForgeProvider::GitHub,
            "https://api.github.com/",
            Credentials::Token("ghp_secret_value".into()),
        );
        let transport = HttpTransport::new(&config);
        assert_eq!(transport.base_url(), "https://api.github.com");
        let debug = format!("{:?}", transport);
        assert!(!debug.contains("ghp_secret_value"));
    }
}
