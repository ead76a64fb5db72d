//! Deadline helper for provider calls.
//!
//! The HTTP client carries its own timeout; this wrapper bounds the whole
//! exchange, including body decoding, and turns expiry into a
//! `WardenError::Timeout`.

use std::future::Future;
use std::time::Duration;

use crate::types::{Result, WardenError};

/// Execute an async operation with a timeout
///
/// ```ignore
/// let response = with_timeout(
///     Duration::from_secs(30),
///     provider.complete(&request),
///     "chat completion",
/// )
/// .await?;
/// ```
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(WardenError::timeout(operation_name, timeout)),
    }
}
