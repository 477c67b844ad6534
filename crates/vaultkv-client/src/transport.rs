//! HTTP transport seam.
//!
//! The resolver and executor never touch `reqwest` directly; they hand an
//! [`HttpRequest`] to a [`Transport`] and get back either a [`RawResponse`]
//! (any status) or a [`TransportError`] (no response at all).

use async_trait::async_trait;
use serde_json::Value;

use crate::config::VaultConfig;
use crate::error::{TransportError, VaultError};

const TOKEN_HEADER: &str = "X-Vault-Token";
const NAMESPACE_HEADER: &str = "X-Vault-Namespace";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Delete => Self::DELETE,
        }
    }
}

/// A fully addressed request, ready to send.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    /// Build a request for `api_path` (relative to `/v1/`) carrying the
    /// token header and, only when configured, the namespace header.
    pub fn vault(config: &VaultConfig, method: HttpMethod, api_path: &str) -> Self {
        let mut headers = vec![(TOKEN_HEADER, config.token().to_owned())];
        if let Some(ns) = config.namespace().filter(|ns| !ns.is_empty()) {
            headers.push((NAMESPACE_HEADER, ns.to_owned()));
        }
        Self {
            method,
            url: config.url(api_path),
            headers,
            body: None,
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and body of a received response, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_server_error(&self) -> bool {
        (500..=599).contains(&self.status)
    }
}

/// Sends one HTTP request. Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError>;
}

/// [`Transport`] backed by a single `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build the HTTP client from the timeouts and TLS settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Config`] if a PEM blob is invalid or the client
    /// cannot be built.
    pub fn new(config: &VaultConfig) -> Result<Self, VaultError> {
        let ssl = config.ssl();
        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.open_timeout())
            .timeout(config.read_timeout())
            .danger_accept_invalid_certs(!ssl.verify)
            .user_agent(concat!("vaultkv/", env!("CARGO_PKG_VERSION")));

        if let Some(pem) = &ssl.ca_pem {
            let cert = reqwest::Certificate::from_pem(pem)
                .map_err(|e| VaultError::Config(format!("invalid CA certificate: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }
        if let Some(pem) = &ssl.client_pem {
            let identity = reqwest::Identity::from_pem(pem)
                .map_err(|e| VaultError::Config(format!("invalid client certificate: {e}")))?;
            builder = builder.identity(identity);
        }

        let client = builder
            .build()
            .map_err(|e| VaultError::Config(format!("failed to build http client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut req = self.client.request(method.into(), &url);
        for (name, value) in &headers {
            req = req.header(*name, value);
        }
        if let Some(ref b) = body {
            req = req.json(b);
        }

        let resp = req.send().await.map_err(|e| classify(&url, e))?;
        let status = resp.status().as_u16();
        let bytes = resp.bytes().await.map_err(|e| classify(&url, e))?;

        Ok(RawResponse {
            status,
            body: bytes.to_vec(),
        })
    }
}

fn classify(url: &str, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            url: url.to_owned(),
            source: Box::new(err),
        }
    } else if err.is_connect() {
        TransportError::Connect {
            url: url.to_owned(),
            source: Box::new(err),
        }
    } else {
        TransportError::Request(err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(namespace: Option<&str>) -> VaultConfig {
        let mut builder = VaultConfig::builder("http://127.0.0.1:8200").token("mock_token");
        if let Some(ns) = namespace {
            builder = builder.namespace(ns);
        }
        builder.build().unwrap()
    }

    #[test]
    fn vault_request_carries_token() {
        let req = HttpRequest::vault(&config(None), HttpMethod::Get, "secret/foo");
        assert_eq!(req.url, "http://127.0.0.1:8200/v1/secret/foo");
        assert_eq!(req.header("x-vault-token"), Some("mock_token"));
        assert_eq!(req.header(NAMESPACE_HEADER), None);
    }

    #[test]
    fn vault_request_carries_namespace_when_configured() {
        let req = HttpRequest::vault(&config(Some("team-a")), HttpMethod::Get, "secret/foo");
        assert_eq!(req.header(NAMESPACE_HEADER), Some("team-a"));
    }

    #[test]
    fn server_error_range() {
        assert!(RawResponse::new(500, "").is_server_error());
        assert!(RawResponse::new(503, "").is_server_error());
        assert!(!RawResponse::new(404, "").is_server_error());
        assert!(!RawResponse::new(200, "").is_server_error());
    }

    #[test]
    fn reqwest_transport_builds_with_verification_disabled() {
        let config = VaultConfig::builder("https://vault:8200")
            .token("t")
            .ssl_verify(false)
            .build()
            .unwrap();
        assert!(ReqwestTransport::new(&config).is_ok());
    }
}
