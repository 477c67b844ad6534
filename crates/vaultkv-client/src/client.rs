//! `VaultClient` implementation.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use crate::config::VaultConfig;
use crate::error::VaultError;
use crate::executor::{RequestExecutor, RetryPolicy};
use crate::mount::MountInfo;
use crate::path::LogicalOperation;
use crate::response::VaultResponse;
use crate::seal::{SEAL_STATUS_ROUTE, SealStatus};
use crate::transport::{HttpMethod, ReqwestTransport, Transport};
use crate::VaultClient;

impl VaultClient {
    /// Create a client that talks HTTP through `reqwest`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Config`] if the TLS material is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: VaultConfig) -> Result<Self, VaultError> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client from `VAULT_*` environment variables.
    ///
    /// # Errors
    ///
    /// See [`VaultConfig::from_env`] and [`VaultClient::new`].
    pub fn from_env() -> Result<Self, VaultError> {
        Self::new(VaultConfig::from_env()?)
    }

    /// Create a client over any [`Transport`].
    pub fn with_transport(config: VaultConfig, transport: Arc<dyn Transport>) -> Self {
        let retry = RetryPolicy::from_config(&config);
        let config = Arc::new(config);
        let executor = Arc::new(RequestExecutor::new(Arc::clone(&config), transport));
        Self {
            config,
            executor,
            retry,
        }
    }

    /// Override the retry budget for calls made through this client.
    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, interval: Duration) -> Self {
        self.retry = RetryPolicy::new(max_retries, interval);
        self
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Key-value operations.
    pub fn logical(&self) -> Logical<'_> {
        Logical {
            client: self,
            mount: None,
        }
    }

    /// Run only the preflight lookup for `path`.
    ///
    /// # Errors
    ///
    /// See [`MountResolver::resolve`](crate::mount::MountResolver::resolve).
    pub async fn mount_info(&self, path: &str) -> Result<MountInfo, VaultError> {
        self.executor.resolver().resolve(path).await
    }

    /// Fetch the seal status, retrying like any other call.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Service`] or [`VaultError::Transport`] once
    /// retries are exhausted.
    pub async fn seal_status(&self) -> Result<SealStatus, VaultError> {
        let response = self
            .executor
            .execute_raw(HttpMethod::Get, SEAL_STATUS_ROUTE, &self.retry)
            .await?;
        Ok(SealStatus::from_response(&response))
    }
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("config", &self.config)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

/// Key-value operations on paths of the form `{mount}/{secret path}`.
///
/// Every call resolves the mount first unless a [`MountInfo`] was supplied
/// through [`with_mount_info`](Self::with_mount_info).
#[derive(Debug, Clone)]
pub struct Logical<'a> {
    client: &'a VaultClient,
    mount: Option<MountInfo>,
}

impl Logical<'_> {
    /// Use a known mount instead of a preflight lookup per call.
    #[must_use]
    pub fn with_mount_info(mut self, mount: MountInfo) -> Self {
        self.mount = Some(mount);
        self
    }

    /// # Errors
    ///
    /// See [`RequestExecutor::execute`].
    pub async fn read(&self, path: &str) -> Result<VaultResponse, VaultError> {
        self.run(path, LogicalOperation::Read, None).await
    }

    /// Write `data` at `path`; nested under `data` for v2 engines.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::execute`].
    pub async fn write(&self, path: &str, data: Value) -> Result<VaultResponse, VaultError> {
        self.run(path, LogicalOperation::Write, Some(data)).await
    }

    /// List keys beneath `path`. Use [`VaultResponse::list_keys`] on the result.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::execute`].
    pub async fn list(&self, path: &str) -> Result<VaultResponse, VaultError> {
        self.run(path, LogicalOperation::List, None).await
    }

    /// Delete the secret; on a v2 engine this removes all versions and metadata.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::execute`].
    pub async fn delete(&self, path: &str) -> Result<VaultResponse, VaultError> {
        self.run(path, LogicalOperation::Delete, None).await
    }

    /// Soft-delete specific versions (v2).
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::execute`].
    pub async fn delete_versions(
        &self,
        path: &str,
        versions: &[u64],
    ) -> Result<VaultResponse, VaultError> {
        self.run(path, LogicalOperation::VersionDelete, Some(versions_body(versions)))
            .await
    }

    /// Restore soft-deleted versions (v2).
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::execute`].
    pub async fn undelete_versions(
        &self,
        path: &str,
        versions: &[u64],
    ) -> Result<VaultResponse, VaultError> {
        self.run(path, LogicalOperation::VersionUndelete, Some(versions_body(versions)))
            .await
    }

    /// Permanently destroy specific versions (v2).
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::execute`].
    pub async fn destroy_versions(
        &self,
        path: &str,
        versions: &[u64],
    ) -> Result<VaultResponse, VaultError> {
        self.run(path, LogicalOperation::VersionDestroy, Some(versions_body(versions)))
            .await
    }

    async fn run(
        &self,
        path: &str,
        operation: LogicalOperation,
        payload: Option<Value>,
    ) -> Result<VaultResponse, VaultError> {
        let executor = &self.client.executor;
        let policy = &self.client.retry;
        match &self.mount {
            Some(mount) => {
                executor
                    .execute_with_mount(mount, path, operation, payload, policy)
                    .await
            }
            None => executor.execute(path, operation, payload, policy).await,
        }
    }
}

fn versions_body(versions: &[u64]) -> Value {
    json!({ "versions": versions })
}
