//! Seal status (`GET /v1/sys/seal-status`).

use serde::{Deserialize, Serialize};

use crate::response::VaultResponse;

pub(crate) const SEAL_STATUS_ROUTE: &str = "sys/seal-status";

/// Seal state of the server. Missing or malformed fields read as
/// `false`/`0` rather than failing the call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealStatus {
    #[serde(default)]
    pub sealed: bool,
    /// Unseal shares required (`t`).
    #[serde(default, rename = "t")]
    pub threshold: u64,
    /// Unseal shares issued (`n`).
    #[serde(default, rename = "n")]
    pub number_of_shares: u64,
    /// Shares submitted towards the current unseal.
    #[serde(default)]
    pub progress: u64,
    /// Retries consumed fetching this status.
    #[serde(skip)]
    pub retries: u32,
}

impl SealStatus {
    pub(crate) fn from_response(response: &VaultResponse) -> Self {
        let mut status: Self = serde_json::from_slice(response.body()).unwrap_or_default();
        status.retries = response.retries();
        status
    }
}
