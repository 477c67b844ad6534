//! Error types for the Vault KV client.
//!
//! Every failure surfaces as a [`VaultError`]. Transport failures (no HTTP
//! response at all) are kept apart from service failures (a response with a
//! non-success status) so callers can tell "unreachable" from "refused".

/// Boxed cause kept under a [`TransportError`] so the full chain (down to the
/// OS-level I/O error) stays reachable through `Error::source`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure to obtain any HTTP response from the server.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request did not complete within the configured timeouts.
    #[error("request to {url} timed out")]
    Timeout {
        url: String,
        #[source]
        source: BoxError,
    },

    /// The connection (TCP or TLS handshake) could not be established.
    #[error("could not connect to {url}")]
    Connect {
        url: String,
        #[source]
        source: BoxError,
    },

    /// Any other error raised by the HTTP client.
    #[error("http client error")]
    Request(#[source] reqwest::Error),
}

/// All errors that can occur when talking to Vault.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// Invalid or incomplete client configuration.
    #[error("vault config error: {0}")]
    Config(String),

    /// No response was received, even after retrying.
    #[error("vault unreachable after {attempts} attempt(s): {source}")]
    Transport {
        /// Number of HTTP attempts made for the logical call.
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// Vault answered with a status the operation does not accept.
    #[error("Vault responded with HTTP status code: {status}\nResponse body: {body}")]
    Service {
        /// HTTP status code of the last response.
        status: u16,
        /// Raw response body, decoded lossily as UTF-8.
        body: String,
        /// Number of HTTP attempts made for the logical call.
        attempts: u32,
    },

    /// The mount introspection response could not be parsed (strict mode only).
    #[error("malformed mount info response: {reason}")]
    MountParse { reason: String },

    /// A response body was not the JSON the caller asked for.
    #[error("vault json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VaultError {
    /// HTTP status code carried by the error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Number of HTTP attempts that preceded the error, if any were made.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Service { attempts, .. } | Self::Transport { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    pub(crate) fn service(status: u16, body: &[u8], attempts: u32) -> Self {
        Self::Service {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
            attempts,
        }
    }
}
