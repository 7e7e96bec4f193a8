//! Condition-based waits
//!
//! UI rendering is asynchronous, so a query is not satisfied until the
//! underlying condition holds or a bounded wait elapses. Fixed-duration
//! sleeps are not used anywhere in the harness; everything goes through
//! these polls.

use std::future::Future;
use std::time::{Duration, Instant};

use qadrive_common::{Error, Result};

/// Poll `check` until it returns `Ok(true)` or `timeout` elapses.
///
/// `condition` names what is being waited for and ends up in the
/// `AssertionTimeout` error verbatim. Errors from `check` other than
/// timeouts propagate immediately.
pub async fn poll_until<F, Fut>(
    condition: &str,
    timeout: Duration,
    interval: Duration,
    mut check: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = Instant::now();
    loop {
        if check().await? {
            return Ok(());
        }
        if start.elapsed() >= timeout {
            return Err(Error::AssertionTimeout {
                condition: condition.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        tokio::time::sleep(interval).await;
    }
}

/// Poll `fetch` until `predicate` accepts its value; returns the value.
pub async fn poll_for<T, F, Fut, P>(
    condition: &str,
    timeout: Duration,
    interval: Duration,
    mut fetch: F,
    predicate: P,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&T) -> bool,
{
    let start = Instant::now();
    loop {
        let value = fetch().await?;
        if predicate(&value) {
            return Ok(value);
        }
        if start.elapsed() >= timeout {
            return Err(Error::AssertionTimeout {
                condition: condition.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        tokio::time::sleep(interval).await;
    }
}
