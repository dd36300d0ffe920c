// ABOUTME: Test support utilities.
// ABOUTME: Provides a scripted in-memory HTTP sender and tracing setup for integration tests.

use bytes::Bytes;
use hyper::HeaderMap;
use parking_lot::Mutex;
use rokka::transport::{HttpRequest, HttpResponse, HttpSender, RequestBody, TransportError};
use std::collections::VecDeque;
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("rokka=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// One canned reply of a [`ScriptedSender`].
#[derive(Debug, Clone)]
pub enum Reply {
    Response {
        status: u16,
        headers: Vec<(&'static str, String)>,
        body: Bytes,
    },
    /// The request never reached the server.
    Fail(&'static str),
}

#[allow(dead_code)]
impl Reply {
    pub fn status(status: u16) -> Self {
        Reply::Response {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn json(status: u16, value: serde_json::Value) -> Self {
        Reply::Response {
            status,
            headers: vec![("content-type", "application/json".to_string())],
            body: Bytes::from(value.to_string()),
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        if let Reply::Response { headers, .. } = &mut self {
            headers.push((name, value.into()));
        }
        self
    }

    fn build(&self) -> Result<HttpResponse, TransportError> {
        match self {
            Reply::Response {
                status,
                headers,
                body,
            } => {
                let mut builder = hyper::Response::builder().status(*status);
                for (name, value) in headers {
                    builder = builder.header(*name, value.as_str());
                }
                Ok(builder.body(body.clone()).unwrap())
            }
            Reply::Fail(message) => Err(TransportError::request(*message)),
        }
    }
}

/// What the sender saw.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

#[allow(dead_code)]
impl Recorded {
    pub fn body_json(&self) -> serde_json::Value {
        match &self.body {
            RequestBody::Bytes(bytes) => serde_json::from_slice(bytes).unwrap(),
            other => panic!("expected a JSON body, got {other:?}"),
        }
    }
}

type Route = Box<dyn Fn(&HttpRequest) -> Reply + Send + Sync>;

/// In-memory sender. Either replays a queue of replies (repeating the last
/// one once the queue runs dry) or answers through a routing closure.
pub struct ScriptedSender {
    queue: Mutex<VecDeque<Reply>>,
    last: Mutex<Option<Reply>>,
    route: Option<Route>,
    requests: Mutex<Vec<Recorded>>,
}

#[allow(dead_code)]
impl ScriptedSender {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            queue: Mutex::new(replies.into_iter().collect()),
            last: Mutex::new(None),
            route: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn routed(route: impl Fn(&HttpRequest) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            route: Some(Box::new(route)),
            ..Self::new([])
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn next_reply(&self, request: &HttpRequest) -> Reply {
        if let Some(route) = &self.route {
            return route(request);
        }

        let mut last = self.last.lock();
        match self.queue.lock().pop_front() {
            Some(reply) => {
                *last = Some(reply.clone());
                reply
            }
            None => last.clone().expect("scripted sender has no replies"),
        }
    }
}

#[async_trait::async_trait]
impl HttpSender for ScriptedSender {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(Recorded {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            query: request.uri().query().map(str::to_string),
            headers: request.headers().clone(),
            body: request.body().clone(),
        });
        self.next_reply(request).build()
    }
}
