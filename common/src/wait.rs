//! Polling helpers for backends that finish work asynchronously.

use crate::cloudprovider::CloudResource;
use crate::errors::CloudError;
use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Refresh `res` every `interval` until its status equals `expected`.
///
/// A failed refresh aborts the wait immediately.
pub async fn wait_status<R>(
    res: &mut R,
    expected: &str,
    interval: Duration,
    timeout: Duration,
) -> Result<()>
where
    R: CloudResource + ?Sized,
{
    let start = Instant::now();
    while start.elapsed() < timeout {
        res.refresh().await?;
        let status = res.status();
        if status == expected {
            return Ok(());
        }
        tracing::debug!(
            "Waiting for {} to become {}, currently {}",
            res.global_id(),
            expected,
            status
        );
        sleep(interval).await;
    }
    Err(CloudError::Timeout(format!(
        "{} did not reach status {} within {:?}",
        res.global_id(),
        expected,
        timeout
    ))
    .into())
}

/// Call `probe` every `interval` until it yields a value.
pub async fn wait_created<T, F, Fut>(interval: Duration, timeout: Duration, mut probe: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let start = Instant::now();
    while start.elapsed() < timeout {
        if let Some(value) = probe().await {
            return Ok(value);
        }
        sleep(interval).await;
    }
    Err(CloudError::Timeout(format!("resource not created within {:?}", timeout)).into())
}
