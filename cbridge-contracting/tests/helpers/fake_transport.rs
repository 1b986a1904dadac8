//! Scripted HTTP transport
//!
//! Routes are matched by method and URL suffix. Each route replays its
//! replies in order and repeats the last one forever. Every request is
//! recorded for later assertions. An unscripted request panics: with an
//! unbounded retry policy it would otherwise spin forever.

use async_trait::async_trait;
use cbridge_contracting::services::http_transport::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One scripted answer
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, String),
    NetworkError,
}

impl Reply {
    pub fn status(status: u16) -> Self {
        Reply::Status(status, String::new())
    }

    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Reply::Status(status, body.into())
    }
}

struct Route {
    method: HttpMethod,
    suffix: String,
    replies: VecDeque<Reply>,
}

#[derive(Default)]
struct Inner {
    routes: Vec<Route>,
    requests: Vec<HttpRequest>,
}

/// Cheap to clone; clones share routes and the request log
#[derive(Clone, Default)]
pub struct FakeTransport {
    inner: Arc<Mutex<Inner>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script `replies` for `method` requests whose URL ends with `suffix`
    pub fn on(&self, method: HttpMethod, suffix: &str, replies: Vec<Reply>) -> &Self {
        assert!(!replies.is_empty(), "route {} needs at least one reply", suffix);
        self.inner.lock().unwrap().routes.push(Route {
            method,
            suffix: suffix.to_string(),
            replies: replies.into(),
        });
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, method: HttpMethod, suffix: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.url.ends_with(suffix))
            .collect()
    }

    pub fn count(&self, method: HttpMethod, suffix: &str) -> usize {
        self.requests_to(method, suffix).len()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let reply = {
            let mut inner = self.inner.lock().unwrap();
            inner.requests.push(request.clone());

            let route = inner
                .routes
                .iter_mut()
                .find(|route| route.method == request.method && request.url.ends_with(&route.suffix))
                .unwrap_or_else(|| panic!("unscripted request: {} {}", request.method.as_str(), request.url));

            if route.replies.len() > 1 {
                route.replies.pop_front().unwrap()
            } else {
                route.replies.front().cloned().unwrap()
            }
        };

        // Let sibling tasks interleave like a real network call would
        tokio::task::yield_now().await;

        match reply {
            Reply::Status(status, body) => Ok(HttpResponse::new(status, body)),
            Reply::NetworkError => Err(TransportError::Network("connection reset".to_string())),
        }
    }
}
