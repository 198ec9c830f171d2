//! Shared fixtures for the adapter tests.

use crate::client::{WinStackClient, WinStackConfig};
use crate::region::Region;
use mockito::{Matcher, Mock, ServerGuard};
use std::sync::Arc;

pub(crate) const REGION_BODY: &str = r#"{"data":[{"id":"pool-1","name":"Pool One"},{"id":"pool-2","name":"Pool Two"}]}"#;

/// Matches `path` with or without a query string, but not longer paths.
pub(crate) fn path(path: &str) -> Matcher {
    Matcher::Regex(format!(r"^{}(\?.*)?$", regex::escape(path)))
}

pub(crate) async fn mock_session(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", "/api/check/session")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"valid":true}"#)
        .expect_at_least(0)
        .create_async()
        .await
}

pub(crate) async fn mock_json(
    server: &mut ServerGuard,
    method: &str,
    url: &str,
    body: &str,
) -> Mock {
    server
        .mock(method, path(url))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

pub(crate) async fn test_client(server: &mut ServerGuard) -> Arc<WinStackClient> {
    mock_session(server).await;
    mock_json(server, "GET", "/api/compute/pools", REGION_BODY).await;
    WinStackClient::new(WinStackConfig::new(&server.url(), "admin", "secret"))
        .await
        .unwrap()
}

pub(crate) async fn test_region(server: &mut ServerGuard) -> Region {
    test_client(server).await.get_region("pool-1").unwrap()
}
