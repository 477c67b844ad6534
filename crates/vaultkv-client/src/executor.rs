//! Retrying request execution.
//!
//! One logical call runs as:
//!
//! 1. preflight: a single mount lookup (skipped when the caller already holds
//!    a [`MountInfo`]). It does not use the retry budget and a failure ends
//!    the call.
//! 2. adapt: rewrite path and body for the engine version.
//! 3. attempt: send; on a 5xx or a transport failure, sleep and try again
//!    while `retries < max_retries`. Any other unaccepted status fails at
//!    once.
//!
//! Retries are counted per logical call. A success reports how many it used.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::VaultConfig;
use crate::error::{TransportError, VaultError};
use crate::mount::{MountInfo, MountResolver};
use crate::path::LogicalOperation;
use crate::payload::adapt;
use crate::response::VaultResponse;
use crate::transport::{HttpMethod, HttpRequest, RawResponse, Transport};

/// Retry budget for one logical call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one.
    pub max_retries: u32,
    /// Delay before each retry.
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, interval: Duration) -> Self {
        Self {
            max_retries,
            interval,
        }
    }

    pub fn from_config(config: &VaultConfig) -> Self {
        Self::new(config.max_retries(), config.retry_interval())
    }
}

/// Result of the attempt loop, before it becomes a response or an error.
#[derive(Debug)]
struct RetryOutcome {
    /// Last response observed, successful or not.
    response: Option<RawResponse>,
    attempts_made: u32,
    succeeded: bool,
    /// Last transport failure, if any attempt produced one.
    transport_error: Option<TransportError>,
}

impl RetryOutcome {
    fn into_result(self) -> Result<VaultResponse, VaultError> {
        if let Some(resp) = self.response {
            if self.succeeded {
                let retries = self.attempts_made.saturating_sub(1);
                return Ok(VaultResponse::new(resp.status, resp.body, retries));
            }
            return Err(VaultError::service(resp.status, &resp.body, self.attempts_made));
        }

        let source = self.transport_error.unwrap_or_else(|| TransportError::Connect {
            url: String::new(),
            source: "no attempt was made".into(),
        });
        Err(VaultError::Transport {
            attempts: self.attempts_made,
            source,
        })
    }
}

/// Runs logical key-value operations with preflight and retry.
pub struct RequestExecutor {
    config: Arc<VaultConfig>,
    transport: Arc<dyn Transport>,
    resolver: MountResolver,
}

impl RequestExecutor {
    pub fn new(config: Arc<VaultConfig>, transport: Arc<dyn Transport>) -> Self {
        let resolver = MountResolver::new(Arc::clone(&config), Arc::clone(&transport));
        Self {
            config,
            transport,
            resolver,
        }
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn resolver(&self) -> &MountResolver {
        &self.resolver
    }

    /// Resolve the mount for `path`, then run the operation against it.
    ///
    /// # Errors
    ///
    /// - Any error from [`MountResolver::resolve`], without retry.
    /// - [`VaultError::Service`] with the last status and body once retries
    ///   are exhausted, or immediately for a non-retryable status.
    /// - [`VaultError::Transport`] if no attempt ever got a response.
    pub async fn execute(
        &self,
        path: &str,
        operation: LogicalOperation,
        payload: Option<Value>,
        policy: &RetryPolicy,
    ) -> Result<VaultResponse, VaultError> {
        let mount = self.resolver.resolve(path).await?;
        self.execute_with_mount(&mount, path, operation, payload, policy)
            .await
    }

    /// Run the operation against an already known mount; no preflight.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute), minus the preflight errors.
    pub async fn execute_with_mount(
        &self,
        mount: &MountInfo,
        path: &str,
        operation: LogicalOperation,
        payload: Option<Value>,
        policy: &RetryPolicy,
    ) -> Result<VaultResponse, VaultError> {
        let adapted = adapt(mount, path, operation, payload);
        debug!(
            operation = %operation,
            path = %path,
            final_path = %adapted.final_path,
            engine_version = mount.engine_version(),
            "request adapted"
        );

        let request = HttpRequest::vault(&self.config, operation.method(), &adapted.final_path)
            .with_body(adapted.body);

        let outcome = self
            .attempt_loop(request, policy, |status| operation.accepts_status(status))
            .await;
        outcome
            .into_result()
            .map(|resp| resp.for_operation(operation, mount.engine_version()))
    }

    /// Send a non-logical API call (no preflight, no rewriting) with retry.
    /// Only 2xx counts as success.
    ///
    /// # Errors
    ///
    /// Same as [`execute_with_mount`](Self::execute_with_mount).
    pub async fn execute_raw(
        &self,
        method: HttpMethod,
        api_path: &str,
        policy: &RetryPolicy,
    ) -> Result<VaultResponse, VaultError> {
        let request = HttpRequest::vault(&self.config, method, api_path);
        self.attempt_loop(request, policy, |status| (200..=299).contains(&status))
            .await
            .into_result()
    }

    async fn attempt_loop(
        &self,
        request: HttpRequest,
        policy: &RetryPolicy,
        accepts: impl Fn(u16) -> bool,
    ) -> RetryOutcome {
        let mut outcome = RetryOutcome {
            response: None,
            attempts_made: 0,
            succeeded: false,
            transport_error: None,
        };

        loop {
            outcome.attempts_made += 1;
            debug!(url = %request.url, attempt = outcome.attempts_made, "sending request");

            match self.transport.send(request.clone()).await {
                Ok(resp) if accepts(resp.status) => {
                    outcome.response = Some(resp);
                    outcome.succeeded = true;
                    return outcome;
                }
                Ok(resp) => {
                    let retryable = resp.is_server_error();
                    let status = resp.status;
                    outcome.response = Some(resp);
                    if !retryable {
                        debug!(url = %request.url, status, "non-retryable status");
                        return outcome;
                    }
                    warn!(url = %request.url, status, attempt = outcome.attempts_made, "server error");
                }
                Err(e) => {
                    warn!(url = %request.url, error = %e, attempt = outcome.attempts_made, "transport failure");
                    outcome.transport_error = Some(e);
                }
            }

            let retries_used = outcome.attempts_made - 1;
            if retries_used >= policy.max_retries {
                return outcome;
            }
            debug!(
                retry = retries_used + 1,
                max_retries = policy.max_retries,
                interval_ms = u64::try_from(policy.interval.as_millis()).unwrap_or(u64::MAX),
                "retrying after delay"
            );
            tokio::time::sleep(policy.interval).await;
        }
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
