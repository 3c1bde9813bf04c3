//! `reqwest`-backed [`Transport`] for the traffic manager REST API.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use stingray_config::ConnectionConfig;
use stingray_core::{HttpResponse, PoolEndpoint, Reconciler, Transport, TransportError};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),

    #[error("invalid server address: {0}")]
    Endpoint(#[from] url::ParseError),
}

/// HTTPS transport authenticating every request with Basic auth.
pub struct HttpTransport {
    http: reqwest::Client,
    user: String,
    password: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(conn: &ConnectionConfig) -> Result<Self, ClientError> {
        if !conn.verify_tls {
            tracing::warn!(
                server = %conn.server,
                "TLS certificate verification is disabled"
            );
        }
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!conn.verify_tls)
            .timeout(conn.timeout())
            .build()?;
        Ok(Self {
            http,
            user: conn.user.clone(),
            password: conn.password.clone(),
            timeout: conn.timeout(),
        })
    }

    fn request(&self, method: reqwest::Method, url: &Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url.clone())
            .basic_auth(&self.user, Some(&self.password))
            .header("Accept", "application/json")
    }

    async fn send(
        &self,
        req: reqwest::RequestBuilder,
        method: &str,
        url: &Url,
    ) -> Result<HttpResponse, TransportError> {
        let resp = req.send().await.map_err(|e| self.describe(e))?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| self.describe(e))?;
        tracing::debug!(method, %url, status, "request completed");
        Ok(HttpResponse::new(status, body))
    }

    fn describe(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            return TransportError::new(format!(
                "request timed out after {}s",
                self.timeout.as_secs()
            ));
        }
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        TransportError::new(message)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        let req = self.request(reqwest::Method::GET, url);
        self.send(req, "GET", url).await
    }

    async fn put_json(&self, url: &Url, body: &Value) -> Result<HttpResponse, TransportError> {
        let req = self.request(reqwest::Method::PUT, url).json(body);
        self.send(req, "PUT", url).await
    }

    async fn delete(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        let req = self.request(reqwest::Method::DELETE, url);
        self.send(req, "DELETE", url).await
    }
}

/// Reconciler talking HTTPS to `conn.server:conn.port`.
pub fn reconciler(conn: &ConnectionConfig) -> Result<Reconciler<HttpTransport>, ClientError> {
    let endpoint = PoolEndpoint::https(&conn.server, conn.port, &conn.api_version)?;
    Ok(Reconciler::new(HttpTransport::new(conn)?, endpoint))
}
