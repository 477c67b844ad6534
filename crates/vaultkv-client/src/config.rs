//! Client configuration.
//!
//! A [`VaultConfig`] is built once, either through [`VaultConfigBuilder`] or
//! from `VAULT_*` environment variables, and is then shared read-only by the
//! mount resolver and the request executor.

use std::fmt;
use std::time::Duration;

use crate::error::VaultError;

const DEFAULT_ADDRESS: &str = "http://127.0.0.1:8200";
const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(1000);

/// How to treat a mount introspection body that cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MountParsing {
    /// Keep whatever was parsed, default the rest, log a warning.
    #[default]
    Lenient,
    /// Fail the call with [`VaultError::MountParse`].
    Strict,
}

/// TLS settings for the HTTP transport.
#[derive(Clone)]
pub struct SslConfig {
    /// Verify the server certificate chain and hostname.
    pub verify: bool,
    /// Extra PEM-encoded trust anchor(s).
    pub ca_pem: Option<Vec<u8>>,
    /// PEM-encoded client certificate and private key for mutual TLS.
    pub client_pem: Option<Vec<u8>>,
}

impl Default for SslConfig {
    fn default() -> Self {
        Self {
            verify: true,
            ca_pem: None,
            client_pem: None,
        }
    }
}

impl fmt::Debug for SslConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SslConfig")
            .field("verify", &self.verify)
            .field("ca_pem", &self.ca_pem.as_ref().map(Vec::len))
            .field("client_pem", &self.client_pem.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Immutable configuration shared by every request.
#[derive(Clone)]
pub struct VaultConfig {
    address: String,
    token: String,
    namespace: Option<String>,
    open_timeout: Duration,
    read_timeout: Duration,
    ssl: SslConfig,
    max_retries: u32,
    retry_interval: Duration,
    mount_parsing: MountParsing,
    trim_mount_path: bool,
}

impl VaultConfig {
    /// Start building a configuration for the given server address.
    pub fn builder(address: impl Into<String>) -> VaultConfigBuilder {
        VaultConfigBuilder::new(address)
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `VAULT_ADDR`: server address (default: `http://127.0.0.1:8200`)
    /// - `VAULT_TOKEN`: authentication token (required)
    /// - `VAULT_NAMESPACE`: enterprise namespace (optional, must not be empty)
    /// - `VAULT_OPEN_TIMEOUT`: connect timeout in seconds (default: `30`)
    /// - `VAULT_READ_TIMEOUT`: request timeout in seconds (default: `60`)
    /// - `VAULT_SSL_VERIFY`: `false` or `0` disables verification (default: `true`)
    /// - `VAULT_SSL_CERT`: path to a PEM trust anchor (optional)
    /// - `VAULT_MAX_RETRIES`: retries per logical call (default: `0`)
    /// - `VAULT_RETRY_INTERVAL_MS`: delay between retries (default: `1000`)
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Config`] if the token is missing, the namespace is
    /// empty, or the certificate file cannot be read.
    pub fn from_env() -> Result<Self, VaultError> {
        let address = std::env::var("VAULT_ADDR").unwrap_or_else(|_| DEFAULT_ADDRESS.to_owned());
        let mut builder = VaultConfigBuilder::new(address)
            .token(std::env::var("VAULT_TOKEN").unwrap_or_default());

        if let Ok(ns) = std::env::var("VAULT_NAMESPACE") {
            builder = builder.namespace(ns);
        }
        if let Some(secs) = env_parse::<u64>("VAULT_OPEN_TIMEOUT") {
            builder = builder.open_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = env_parse::<u64>("VAULT_READ_TIMEOUT") {
            builder = builder.read_timeout(Duration::from_secs(secs));
        }
        if let Ok(v) = std::env::var("VAULT_SSL_VERIFY") {
            builder = builder.ssl_verify(v != "false" && v != "0");
        }
        if let Ok(path) = std::env::var("VAULT_SSL_CERT") {
            let pem = std::fs::read(&path).map_err(|e| {
                VaultError::Config(format!("failed to read VAULT_SSL_CERT at {path}: {e}"))
            })?;
            builder = builder.ca_pem(pem);
        }
        if let Some(n) = env_parse::<u32>("VAULT_MAX_RETRIES") {
            builder = builder.max_retries(n);
        }
        if let Some(ms) = env_parse::<u64>("VAULT_RETRY_INTERVAL_MS") {
            builder = builder.retry_interval(Duration::from_millis(ms));
        }

        builder.build()
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// The namespace, if one was configured. Never `Some("")`.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn open_timeout(&self) -> Duration {
        self.open_timeout
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn ssl(&self) -> &SslConfig {
        &self.ssl
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    pub fn mount_parsing(&self) -> MountParsing {
        self.mount_parsing
    }

    /// Whether a trailing `/` is dropped from resolved mount paths.
    pub fn trim_mount_path(&self) -> bool {
        self.trim_mount_path
    }

    /// Absolute URL for an API path such as `secret/data/foo`.
    pub fn url(&self, api_path: &str) -> String {
        format!("{}/v1/{api_path}", self.address)
    }
}

impl fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultConfig")
            .field("address", &self.address)
            .field("token", &"[redacted]")
            .field("namespace", &self.namespace)
            .field("open_timeout", &self.open_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("ssl", &self.ssl)
            .field("max_retries", &self.max_retries)
            .field("retry_interval", &self.retry_interval)
            .field("mount_parsing", &self.mount_parsing)
            .field("trim_mount_path", &self.trim_mount_path)
            .finish()
    }
}

/// Builder for [`VaultConfig`].
#[derive(Debug)]
pub struct VaultConfigBuilder {
    address: String,
    token: String,
    namespace: Option<String>,
    open_timeout: Duration,
    read_timeout: Duration,
    ssl: SslConfig,
    max_retries: u32,
    retry_interval: Duration,
    mount_parsing: MountParsing,
    trim_mount_path: bool,
}

impl VaultConfigBuilder {
    /// Create a new builder with the server address.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: String::new(),
            namespace: None,
            open_timeout: DEFAULT_OPEN_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            ssl: SslConfig::default(),
            max_retries: 0,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            mount_parsing: MountParsing::default(),
            trim_mount_path: false,
        }
    }

    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Set the namespace sent as `X-Vault-Namespace`. An empty value is
    /// rejected by [`build`](Self::build).
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    #[must_use]
    pub fn open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    #[must_use]
    pub fn ssl_verify(mut self, verify: bool) -> Self {
        self.ssl.verify = verify;
        self
    }

    #[must_use]
    pub fn ca_pem(mut self, pem: Vec<u8>) -> Self {
        self.ssl.ca_pem = Some(pem);
        self
    }

    #[must_use]
    pub fn client_pem(mut self, pem: Vec<u8>) -> Self {
        self.ssl.client_pem = Some(pem);
        self
    }

    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    #[must_use]
    pub fn mount_parsing(mut self, mode: MountParsing) -> Self {
        self.mount_parsing = mode;
        self
    }

    /// Drop a trailing `/` from mount paths returned by the preflight, so a
    /// mount reported as `secret/` splices to `secret/data/app` rather than
    /// `secret//dataapp`. Off by default: the path is used as Vault reports it.
    #[must_use]
    pub fn trim_mount_path(mut self, trim: bool) -> Self {
        self.trim_mount_path = trim;
        self
    }

    /// Validate and freeze the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Config`] if the address or token is empty, or if
    /// a namespace was set to the empty string.
    pub fn build(self) -> Result<VaultConfig, VaultError> {
        let address = self.address.trim_end_matches('/').to_owned();
        if address.is_empty() {
            return Err(VaultError::Config("missing vault address".to_owned()));
        }
        if self.token.is_empty() {
            return Err(VaultError::Config(
                "missing token: set VAULT_TOKEN or pass a token to the builder".to_owned(),
            ));
        }
        if self.namespace.as_deref() == Some("") {
            return Err(VaultError::Config("a namespace cannot be empty".to_owned()));
        }

        Ok(VaultConfig {
            address,
            token: self.token,
            namespace: self.namespace,
            open_timeout: self.open_timeout,
            read_timeout: self.read_timeout,
            ssl: self.ssl,
            max_retries: self.max_retries,
            retry_interval: self.retry_interval,
            mount_parsing: self.mount_parsing,
            trim_mount_path: self.trim_mount_path,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_defaults() {
        let config = VaultConfig::builder("http://vault:8200").token("t").build().unwrap();
        assert_eq!(config.address(), "http://vault:8200");
        assert_eq!(config.namespace(), None);
        assert_eq!(config.open_timeout(), DEFAULT_OPEN_TIMEOUT);
        assert_eq!(config.read_timeout(), DEFAULT_READ_TIMEOUT);
        assert!(config.ssl().verify);
        assert_eq!(config.max_retries(), 0);
        assert_eq!(config.retry_interval(), DEFAULT_RETRY_INTERVAL);
        assert_eq!(config.mount_parsing(), MountParsing::Lenient);
        assert!(!config.trim_mount_path());
    }

    #[test]
    fn builder_trims_trailing_slash() {
        let config = VaultConfig::builder("http://vault:8200//").token("t").build().unwrap();
        assert_eq!(config.url("secret/foo"), "http://vault:8200/v1/secret/foo");
    }

    #[test]
    fn namespace_is_kept_when_set() {
        let config = VaultConfig::builder("http://vault:8200")
            .token("t")
            .namespace("testNameSpace")
            .build()
            .unwrap();
        assert_eq!(config.namespace(), Some("testNameSpace"));
    }

    #[test]
    fn empty_namespace_rejected() {
        let err = VaultConfig::builder("http://vault:8200")
            .token("t")
            .namespace("")
            .build()
            .unwrap_err();
        assert!(matches!(err, VaultError::Config(ref msg) if msg == "a namespace cannot be empty"));
    }

    #[test]
    fn missing_token_rejected() {
        let err = VaultConfig::builder("http://vault:8200").build().unwrap_err();
        assert!(matches!(err, VaultError::Config(_)));
    }

    #[test]
    fn debug_redacts_token() {
        let config = VaultConfig::builder("http://vault:8200")
            .token("s.supersecret")
            .build()
            .unwrap();
        let printed = format!("{config:?}");
        assert!(!printed.contains("supersecret"));
        assert!(printed.contains("[redacted]"));
    }
}
