//! Mount discovery.
//!
//! Before each logical operation the client asks Vault which mount a path
//! belongs to and which key-value engine version serves it, through
//! `GET /v1/sys/internal/ui/mounts/{path}`. The answer is a [`MountInfo`].

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{MountParsing, VaultConfig};
use crate::error::VaultError;
use crate::transport::{HttpMethod, HttpRequest, Transport};

/// Introspection route, relative to `/v1/`.
const PREFLIGHT_ROUTE: &str = "sys/internal/ui/mounts/";

/// Where a path is mounted and which engine version serves it.
///
/// `engine_version` is `0` when a preflight body could not be parsed far
/// enough to learn it; such a mount is treated like version 1.
#[derive(Debug, Clone, PartialEq)]
pub struct MountInfo {
    mount_path: String,
    engine_version: u32,
    raw_metadata: Value,
}

impl MountInfo {
    /// A mount whose location and version are already known.
    pub fn new(mount_path: impl Into<String>, engine_version: u32) -> Self {
        Self {
            mount_path: mount_path.into(),
            engine_version,
            raw_metadata: Value::Null,
        }
    }

    fn unresolved() -> Self {
        Self::new(String::new(), 0)
    }

    /// Parse the body of a mount introspection response.
    ///
    /// Reads `data`, then `path`, then `options.versions`. When the top level
    /// has no `path`, the fields are looked up inside `data`, which is where
    /// Vault itself puts them. `options` absent or null means version 1. The
    /// mount path is kept exactly as reported; see
    /// [`VaultConfigBuilder::trim_mount_path`](crate::VaultConfigBuilder::trim_mount_path).
    ///
    /// # Errors
    ///
    /// In [`MountParsing::Strict`] mode, returns [`VaultError::MountParse`]
    /// when any step fails. In lenient mode parsing never fails: the fields
    /// read before the failure are kept and the rest stay at their defaults.
    pub fn from_preflight(body: &[u8], mode: MountParsing) -> Result<Self, VaultError> {
        let (info, outcome) = parse_preflight(body);
        match (outcome, mode) {
            (Ok(()), _) => Ok(info),
            (Err(reason), MountParsing::Strict) => Err(VaultError::MountParse { reason }),
            (Err(reason), MountParsing::Lenient) => {
                warn!(
                    reason = %reason,
                    mount_path = %info.mount_path,
                    engine_version = info.engine_version,
                    "mount info response only partially parsed, using defaults"
                );
                Ok(info)
            }
        }
    }

    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    pub fn engine_version(&self) -> u32 {
        self.engine_version
    }

    /// The `data` object of the introspection response, or `null`.
    pub fn raw_metadata(&self) -> &Value {
        &self.raw_metadata
    }

    pub fn is_v2(&self) -> bool {
        self.engine_version == 2
    }

    /// The same mount with any trailing `/` removed from its path.
    #[must_use]
    pub fn trimmed(mut self) -> Self {
        let len = self.mount_path.trim_end_matches('/').len();
        self.mount_path.truncate(len);
        self
    }
}

/// Fills `MountInfo` field by field; stops at the first failure and reports
/// it alongside whatever was filled so far.
fn parse_preflight(body: &[u8]) -> (MountInfo, Result<(), String>) {
    let mut info = MountInfo::unresolved();

    let root: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => return (info, Err(format!("body is not JSON: {e}"))),
    };

    let Some(data) = root.get("data").filter(|d| d.is_object()) else {
        return (info, Err("missing `data` object".to_owned()));
    };
    info.raw_metadata = data.clone();

    let scope = if root.get("path").is_some() { &root } else { data };

    let Some(path) = scope.get("path").and_then(Value::as_str) else {
        return (info, Err("missing mount `path`".to_owned()));
    };
    info.mount_path = path.to_owned();

    match scope.get("options") {
        None | Some(Value::Null) => info.engine_version = 1,
        Some(options) if options.is_object() => {
            let raw = options.get("versions").or_else(|| options.get("version"));
            match raw {
                None | Some(Value::Null) => info.engine_version = 1,
                Some(v) => match parse_version(v) {
                    Some(version) => info.engine_version = version,
                    None => return (info, Err(format!("unparseable engine version: {v}"))),
                },
            }
        }
        Some(other) => return (info, Err(format!("`options` is not an object: {other}"))),
    }

    (info, Ok(()))
}

fn parse_version(value: &Value) -> Option<u32> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        _ => None,
    }
}

/// Issues the preflight call. One request per call, never retried here.
pub struct MountResolver {
    config: Arc<VaultConfig>,
    transport: Arc<dyn Transport>,
}

impl MountResolver {
    pub fn new(config: Arc<VaultConfig>, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Look up the mount serving `path`.
    ///
    /// # Errors
    ///
    /// - [`VaultError::Transport`] if no response arrives.
    /// - [`VaultError::Service`] if the status is anything but 200; the
    ///   message carries the response body.
    /// - [`VaultError::MountParse`] on a malformed body in strict mode.
    pub async fn resolve(&self, path: &str) -> Result<MountInfo, VaultError> {
        let request = HttpRequest::vault(
            &self.config,
            HttpMethod::Get,
            &format!("{PREFLIGHT_ROUTE}{path}"),
        );
        debug!(path = %path, "mount preflight");

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|source| VaultError::Transport {
                attempts: 1,
                source,
            })?;

        if response.status != 200 {
            return Err(VaultError::service(response.status, &response.body, 1));
        }

        let mut mount = MountInfo::from_preflight(&response.body, self.config.mount_parsing())?;
        if self.config.trim_mount_path() {
            mount = mount.trimmed();
        }
        info!(
            path = %path,
            mount_path = %mount.mount_path(),
            engine_version = mount.engine_version(),
            "kv mount resolved"
        );
        Ok(mount)
    }
}

impl std::fmt::Debug for MountResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountResolver").finish_non_exhaustive()
    }
}
