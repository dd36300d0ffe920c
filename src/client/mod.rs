// ABOUTME: Thin client for the rokka HTTP API.
// ABOUTME: Adds auth and versioning headers, sends through the retrying transport, decodes JSON.

mod error;
mod sourceimages;

pub use error::{ClientError, ClientErrorKind};
pub use sourceimages::{CopyResponse, ListOptions, ListSourceImagesResponse, SourceImage};

use crate::transport::{
    HttpRequest, HttpResponse, HttpSender, ReqwestSender, RequestBody, RetryPolicy,
    RetryingTransport,
};
use hyper::Method;
use hyper::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_API_ADDRESS: &str = "https://api.rokka.io";
pub const DEFAULT_API_VERSION: &str = "1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for a [`Client`].
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_address: String,
    pub api_version: String,
    pub api_key: Option<String>,
    pub retry: RetryPolicy,
    pub timeout: Duration,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_address", &self.api_address)
            .field("api_version", &self.api_version)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_address: DEFAULT_API_ADDRESS.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            api_key: None,
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn api_address(mut self, address: impl Into<String>) -> Self {
        self.api_address = address.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// rokka API client. Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    transport: Arc<dyn HttpSender>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Client over HTTPS.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let sender = ReqwestSender::new(config.timeout)?;
        Ok(Self::with_sender(config, sender))
    }

    /// Client over a custom sender. Retrying is still layered on top.
    pub fn with_sender(config: ClientConfig, sender: impl HttpSender + 'static) -> Self {
        let transport = RetryingTransport::new(sender, config.retry);
        Self {
            config,
            transport: Arc::new(transport),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Assemble a request against the configured API address. `path` must
    /// already be percent-encoded.
    pub(crate) fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
        body: RequestBody,
    ) -> Result<HttpRequest, ClientError> {
        let mut uri = format!("{}{}", self.config.api_address.trim_end_matches('/'), path);
        if !query.is_empty() {
            let encoded: Vec<String> = query
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect();
            uri.push('?');
            uri.push_str(&encoded.join("&"));
        }

        let mut builder = hyper::Request::builder()
            .method(method)
            .uri(uri)
            .header("Api-Version", self.config.api_version.as_str())
            .header(ACCEPT, "application/json");

        if let Some(key) = &self.config.api_key {
            builder = builder.header("Api-Key", key.as_str());
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        // Multipart bodies get their boundary content type from the sender.
        if !body.is_multipart() {
            builder = builder.header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        Ok(builder.body(body)?)
    }

    /// Send a request and fail on any status >= 400.
    pub(crate) async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        if self.config.api_key.is_none() {
            return Err(ClientError::MissingApiKey);
        }

        let response = self.transport.send(&request).await?;
        let status = response.status();
        if status.as_u16() >= 400 {
            tracing::debug!(
                "{} {} failed with {}",
                request.method(),
                request.uri(),
                status
            );
            return Err(ClientError::from_status(status.as_u16(), response.body()));
        }
        Ok(response)
    }

    /// Send a request and decode its JSON body.
    pub(crate) async fn call<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
    ) -> Result<T, ClientError> {
        let response = self.execute(request).await?;
        Ok(serde_json::from_slice(response.body())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        let config = ClientConfig::default()
            .api_address("https://api.example.test/")
            .api_key("secret");
        Client::new(config).unwrap()
    }

    #[test]
    fn request_carries_headers() {
        let request = client()
            .request(Method::GET, "/sourceimages/acme", &[], &[], RequestBody::Empty)
            .unwrap();

        assert_eq!(
            request.uri().to_string(),
            "https://api.example.test/sourceimages/acme"
        );
        assert_eq!(request.headers()["Api-Version"], "1");
        assert_eq!(request.headers()["Api-Key"], "secret");
        assert_eq!(request.headers()[ACCEPT], "application/json");
        assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn query_is_encoded() {
        let request = client()
            .request(
                Method::GET,
                "/sourceimages/acme",
                &[("limit", "10".to_string()), ("offset", "a b&c".to_string())],
                &[],
                RequestBody::Empty,
            )
            .unwrap();

        assert_eq!(request.uri().query(), Some("limit=10&offset=a%20b%26c"));
    }

    #[test]
    fn multipart_request_has_no_json_content_type() {
        let request = client()
            .request(
                Method::POST,
                "/sourceimages/acme",
                &[],
                &[],
                RequestBody::Multipart(Vec::new()),
            )
            .unwrap();
        assert!(request.headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn debug_redacts_api_key() {
        let rendered = format!("{:?}", client());
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
