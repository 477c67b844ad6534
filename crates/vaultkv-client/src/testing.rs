//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::transport::{HttpRequest, RawResponse, Transport};

/// Replays queued outcomes in order and records every request it sees.
/// Once the script runs dry it answers 500.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(self, status: u16, body: &str) -> Self {
        self.script.lock().unwrap().push_back(Ok(RawResponse::new(status, body)));
        self
    }

    pub(crate) fn respond_n(self, n: usize, status: u16, body: &str) -> Self {
        (0..n).fold(self, |t, _| t.respond(status, body))
    }

    pub(crate) fn refuse(self) -> Self {
        self.script.lock().unwrap().push_back(Err(TransportError::Connect {
            url: "http://127.0.0.1:8200".to_owned(),
            source: Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )),
        }));
        self
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        self.seen.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(RawResponse::new(500, "script exhausted")))
    }
}

/// Preflight body for a v2 mount at `secret`.
pub(crate) const KV2_PREFLIGHT: &str =
    r#"{"data":{"type":"kv"},"path":"secret","options":{"versions":"2"}}"#;

/// Preflight body for a v1 mount at `secret`.
pub(crate) const KV1_PREFLIGHT: &str = r#"{"data":{"type":"kv"},"path":"secret","options":null}"#;
