//! forge::mock
//!
//! Scripted transport for deterministic testing.
//!
//! # Design
//!
//! [`MockTransport`] stands in for the HTTP collaborator underneath a real
//! adapter, so tests exercise the adapter's request construction, error
//! classification, paging, and permission cascade without a network.
//!
//! Expectations are matched in registration order against the request's
//! method, path, and a subset of its query pairs. Each expectation answers
//! once unless marked [`repeat`](Expectation::repeat). A request that
//! matches nothing is recorded and fails with a transport error, so an
//! unexpected extra probe shows up both in the call count and in the result.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use scmbridge::core::types::RepoName;
//! use scmbridge::forge::mock::{Expectation, MockTransport};
//! use scmbridge::forge::stash::StashForge;
//! use scmbridge::forge::{Context, Forge};
//!
//! # tokio_test::block_on(async {
//! let mock = MockTransport::new();
//! mock.expect(
//!     Expectation::get("rest/api/1.0/projects/PRJ/repos/my-repo")
//!         .respond(404, serde_json::json!({"errors": [{"message": "Repository does not exist."}]})),
//! );
//!
//! let forge = StashForge::new(Arc::new(mock.clone()));
//! let repo = RepoName::new("PRJ", "my-repo");
//! let (perm, _) = forge.find_perms(&Context::background(), &repo).await.unwrap();
//!
//! assert!(!perm.pull);
//! assert_eq!(mock.call_count(), 1);
//! # });
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::traits::ScmError;
use super::transport::{Method, RawResponse, Request, Transport};

/// How an expectation answers.
#[derive(Debug, Clone)]
enum Reply {
    Respond(RawResponse),
    Fail(ScmError),
    /// Never completes; only a cancelled context gets the caller out.
    Hang,
}

/// One scripted request/response pair.
#[derive(Debug, Clone)]
pub struct Expectation {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    reply: Reply,
    repeat: bool,
}

impl Expectation {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            method,
            path: path.trim_start_matches('/').to_string(),
            query: Vec::new(),
            reply: Reply::Respond(RawResponse {
                status: 200,
                ..Default::default()
            }),
            repeat: false,
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

    /// Require a query pair. Pairs not named here are ignored when matching.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Answer with a status and a JSON body.
    pub fn respond(self, status: u16, body: serde_json::Value) -> Self {
        let body = if body.is_null() {
            Vec::new()
        } else {
            body.to_string().into_bytes()
        };
        self.respond_raw(status, body)
    }

    /// Answer with a status and an arbitrary body.
    pub fn respond_raw(mut self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        let headers = match &self.reply {
            Reply::Respond(raw) => raw.headers.clone(),
            _ => Vec::new(),
        };
        self.reply = Reply::Respond(RawResponse {
            status,
            headers,
            body: body.into(),
        });
        self
    }

    /// Add a response header. Call after `respond`.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let Reply::Respond(raw) = &mut self.reply {
            raw.headers
                .push((name.to_ascii_lowercase(), value.to_string()));
        }
        self
    }

    /// Fail at the transport level without producing a response.
    pub fn fail(mut self, error: ScmError) -> Self {
        self.reply = Reply::Fail(error);
        self
    }

    /// Never answer.
    pub fn hang(mut self) -> Self {
        self.reply = Reply::Hang;
        self
    }

    /// Keep answering instead of being consumed by the first match.
    pub fn repeat(mut self) -> Self {
        self.repeat = true;
        self
    }

    fn matches(&self, request: &Request) -> bool {
        self.method == request.method
            && self.path == request.path
            && self
                .query
                .iter()
                .all(|(k, v)| request.query_value(k) == Some(v.as_str()))
    }
}

/// Scripted transport.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share
/// expectations and the request log.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockInner>>,
}

#[derive(Debug, Default)]
struct MockInner {
    expectations: Vec<Expectation>,
    requests: Vec<Request>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an expectation.
    pub fn expect(&self, expectation: Expectation) -> &Self {
        self.lock().expectations.push(expectation);
        self
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<Request> {
        self.lock().requests.clone()
    }

    /// Number of requests received, matched or not.
    pub fn call_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Single-use expectations that were never matched.
    pub fn pending(&self) -> usize {
        self.lock()
            .expectations
            .iter()
            .filter(|e| !e.repeat)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, MockInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn answer(&self, request: Request) -> Option<Reply> {
        let mut inner = self.lock();
        let index = inner
            .expectations
            .iter()
            .position(|e| e.matches(&request));
        inner.requests.push(request);

        let index = index?;
        if inner.expectations[index].repeat {
            Some(inner.expectations[index].reply.clone())
        } else {
            Some(inner.expectations.remove(index).reply)
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: Request) -> Result<RawResponse, ScmError> {
        let description = format!("{} {}", request.method, request.path);
        match self.answer(request) {
            Some(Reply::Respond(raw)) => Ok(raw),
            Some(Reply::Fail(err)) => Err(err),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(ScmError::transport(format!(
                "unexpected request: {}",
                description
            ))),
        }
    }
}
