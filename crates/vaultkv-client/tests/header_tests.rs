//! Request headers seen by the server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use axum::http::HeaderMap;

use common::{client, header_validating_vault};
use vaultkv_client::{VaultConfig, VaultError};

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn token_header_is_sent() {
    let addr = header_validating_vault(Arc::new(|h: &HeaderMap| {
        header(h, "x-vault-token") == Some("mock_token")
    }))
    .await;

    let response = client(addr, None).logical().read("kv/hello").await.unwrap();
    assert_eq!(response.data().unwrap()["value"], "ok");
}

#[tokio::test]
async fn namespace_header_is_sent_when_configured() {
    let addr = header_validating_vault(Arc::new(|h: &HeaderMap| {
        header(h, "x-vault-namespace") == Some("test-namespace")
    }))
    .await;

    let response = client(addr, Some("test-namespace"))
        .logical()
        .read("kv/hello")
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn namespace_header_is_absent_by_default() {
    let addr =
        header_validating_vault(Arc::new(|h: &HeaderMap| !h.contains_key("x-vault-namespace")))
            .await;

    client(addr, None).logical().read("kv/hello").await.unwrap();
}

#[tokio::test]
async fn rejected_headers_fail_the_preflight() {
    let addr = header_validating_vault(Arc::new(|_: &HeaderMap| false)).await;

    let err = client(addr, None)
        .with_retries(3, std::time::Duration::from_millis(1))
        .logical()
        .read("kv/hello")
        .await
        .unwrap_err();

    assert!(matches!(err, VaultError::Service { status: 400, attempts: 1, .. }));
}

#[test]
fn empty_namespace_is_rejected() {
    let err = VaultConfig::builder("http://127.0.0.1:8200")
        .token("mock_token")
        .namespace("")
        .build()
        .unwrap_err();

    assert!(err.to_string().contains("a namespace cannot be empty"));
}
