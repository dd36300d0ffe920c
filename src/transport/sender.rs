// ABOUTME: HttpSender seam and its reqwest-backed implementation.
// ABOUTME: Requests are rebuildable so the retry decorator can replay them.

use super::error::{BuildSnafu, TransportError};
use async_trait::async_trait;
use bytes::Bytes;
use snafu::ResultExt;
use std::sync::Arc;
use std::time::Duration;

/// Body of an outgoing request. Kept as owned data so every retry can
/// resend the exact same payload.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Bytes(Bytes),
    Multipart(Vec<FormPart>),
}

impl RequestBody {
    /// Serialize a value as a JSON body.
    pub fn json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_vec(value).map(|v| RequestBody::Bytes(Bytes::from(v)))
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, RequestBody::Multipart(_))
    }
}

/// One field of a multipart/form-data body.
#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: String,
    pub file_name: Option<String>,
    pub data: Bytes,
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            data: Bytes::from(value.into()),
        }
    }

    pub fn file(name: impl Into<String>, file_name: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            file_name: Some(file_name.into()),
            data,
        }
    }
}

pub type HttpRequest = hyper::Request<RequestBody>;
pub type HttpResponse = hyper::Response<Bytes>;

/// Sends a single HTTP request. Implementations make exactly one attempt;
/// retrying is layered on top by `RetryingTransport`.
#[async_trait]
pub trait HttpSender: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: HttpSender + ?Sized> HttpSender for Arc<T> {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}

/// Production sender over HTTPS using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestSender {
    client: reqwest::Client,
}

impl ReqwestSender {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rokka-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .context(BuildSnafu)?;
        Ok(Self { client })
    }

    fn build(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(request.method().clone(), request.uri().to_string())
            .headers(request.headers().clone());

        match request.body() {
            RequestBody::Empty => builder,
            RequestBody::Bytes(bytes) => builder.body(bytes.clone()),
            RequestBody::Multipart(parts) => {
                let form = parts.iter().fold(reqwest::multipart::Form::new(), |form, part| {
                    let mut field = reqwest::multipart::Part::stream(part.data.clone());
                    if let Some(ref file_name) = part.file_name {
                        field = field.file_name(file_name.clone());
                    }
                    form.part(part.name.clone(), field)
                });
                builder.multipart(form)
            }
        }
    }
}

#[async_trait]
impl HttpSender for ReqwestSender {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        tracing::debug!("{} {}", request.method(), request.uri());

        let response = self
            .build(request)
            .send()
            .await
            .map_err(TransportError::request)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(TransportError::request)?;

        tracing::debug!("{} {} -> {}", request.method(), request.uri(), status);

        let mut converted = hyper::Response::new(body);
        *converted.status_mut() = status;
        *converted.headers_mut() = headers;
        Ok(converted)
    }
}
