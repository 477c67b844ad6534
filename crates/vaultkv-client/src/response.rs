//! Responses returned to callers.
//!
//! The raw contract is status, body bytes, and the number of retries the call
//! consumed. The JSON accessors are conveniences on top; callers that need the
//! full envelope decode [`VaultResponse::body`] themselves.

use serde_json::Value;

use crate::error::VaultError;
use crate::path::LogicalOperation;

#[derive(Debug, Clone, PartialEq)]
pub struct VaultResponse {
    status: u16,
    body: Vec<u8>,
    retries: u32,
    operation: Option<LogicalOperation>,
    engine_version: u32,
}

impl VaultResponse {
    pub(crate) fn new(status: u16, body: Vec<u8>, retries: u32) -> Self {
        Self {
            status,
            body,
            retries,
            operation: None,
            engine_version: 0,
        }
    }

    pub(crate) fn for_operation(mut self, operation: LogicalOperation, engine_version: u32) -> Self {
        self.operation = Some(operation);
        self.engine_version = engine_version;
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Retries consumed by the call; the first attempt is not a retry.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn operation(&self) -> Option<LogicalOperation> {
        self.operation
    }

    /// Decode the whole body. An empty body (e.g. 204) decodes to `null`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Json`] if the body is not JSON.
    pub fn json(&self) -> Result<Value, VaultError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// The secret payload: `data`, or `data.data` for a read against a v2
    /// engine. `null` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Json`] if the body is not JSON.
    pub fn data(&self) -> Result<Value, VaultError> {
        let mut envelope = self.json()?;
        let mut data = envelope.get_mut("data").map(Value::take).unwrap_or(Value::Null);
        if self.is_v2_read() {
            data = data.get_mut("data").map(Value::take).unwrap_or(Value::Null);
        }
        Ok(data)
    }

    /// Version metadata of a v2 read (`data.metadata`), `null` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Json`] if the body is not JSON.
    pub fn metadata(&self) -> Result<Value, VaultError> {
        if !self.is_v2_read() {
            return Ok(Value::Null);
        }
        let envelope = self.json()?;
        Ok(envelope
            .pointer("/data/metadata")
            .cloned()
            .unwrap_or(Value::Null))
    }

    /// Keys returned by a list call. A 404 list is an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Json`] if the body is not JSON.
    pub fn list_keys(&self) -> Result<Vec<String>, VaultError> {
        if self.status == 404 {
            return Ok(Vec::new());
        }
        let envelope = self.json()?;
        Ok(envelope
            .pointer("/data/keys")
            .and_then(Value::as_array)
            .map(|keys| {
                keys.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn is_v2_read(&self) -> bool {
        self.engine_version == 2 && self.operation == Some(LogicalOperation::Read)
    }
}
