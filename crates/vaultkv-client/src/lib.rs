//! Vault key-value client.
//!
//! Vault serves key-value secrets through two engine versions with
//! incompatible path layouts. This crate hides the difference: every logical
//! call first asks Vault which mount and engine version serve the path,
//! rewrites path and body to match, and then sends the request with a
//! bounded retry budget.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use serde_json::json;
//! use vaultkv_client::{VaultClient, VaultConfig, VaultError};
//!
//! # async fn example() -> Result<(), VaultError> {
//! let config = VaultConfig::builder("http://127.0.0.1:8200")
//!     .token(std::env::var("VAULT_TOKEN").unwrap_or_default())
//!     .build()?;
//! let client = VaultClient::new(config)?.with_retries(5, Duration::from_millis(100));
//!
//! client.logical().write("secret/app", json!({ "password": "hunter2" })).await?;
//! let secret = client.logical().read("secret/app").await?;
//! assert_eq!(secret.data()?["password"], "hunter2");
//! # Ok(())
//! # }
//! ```

mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod mount;
pub mod path;
pub mod payload;
pub mod response;
pub mod seal;
pub mod transport;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod testing;

pub use client::Logical;
pub use config::{MountParsing, SslConfig, VaultConfig, VaultConfigBuilder};
pub use error::{TransportError, VaultError};
pub use executor::{RequestExecutor, RetryPolicy};
pub use mount::{MountInfo, MountResolver};
pub use path::LogicalOperation;
pub use payload::AdaptedRequest;
pub use response::VaultResponse;
pub use seal::SealStatus;
pub use transport::{HttpMethod, HttpRequest, RawResponse, ReqwestTransport, Transport};

use std::sync::Arc;

/// Vault client. Cheap to share behind a reference; holds only read-only
/// configuration and the transport.
pub struct VaultClient {
    config: Arc<VaultConfig>,
    executor: Arc<RequestExecutor>,
    retry: RetryPolicy,
}
