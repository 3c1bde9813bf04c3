use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Raw HTTP response: status code and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure to get any response at all (connection refused, timeout, TLS).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// HTTP collaborator used by the reconciler.
///
/// Implementations apply authentication, TLS settings and the request timeout.
/// `put_json` must send the body with `content-type: application/json`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError>;

    async fn put_json(&self, url: &Url, body: &Value) -> Result<HttpResponse, TransportError>;

    async fn delete(&self, url: &Url) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for &T {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        (**self).get(url).await
    }

    async fn put_json(&self, url: &Url, body: &Value) -> Result<HttpResponse, TransportError> {
        (**self).put_json(url, body).await
    }

    async fn delete(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        (**self).delete(url).await
    }
}
