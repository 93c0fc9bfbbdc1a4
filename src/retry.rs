//! Retry with exponential backoff for collaborator HTTP calls
//!
//! The default policy makes a single attempt. Retries only happen at the
//! collaborator boundary and only for responses worth repeating. Each attempt
//! has its own deadline; backoff sleeps don't count against it.

use std::future::Future;
use std::time::{Duration, SystemTime};

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::config::HttpConfig;
use crate::{Error, Result};

/// Retry policy for outbound API calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base delay between retries (doubles each attempt)
    pub base_delay: Duration,
    /// Maximum delay cap
    pub max_delay: Duration,
    /// Deadline for a single attempt
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            attempt_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Default backoff with the given number of retries
    #[must_use]
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Policy for a collaborator configured with `http`
    #[must_use]
    pub fn for_http(http: HttpConfig) -> Self {
        Self {
            max_retries: http.max_retries,
            attempt_timeout: http.timeout,
            ..Self::default()
        }
    }
}

/// Whether an HTTP status is worth retrying: rate limits (429) and server errors (5xx)
#[must_use]
pub fn is_recoverable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Read a `Retry-After` header given in seconds
#[must_use]
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let secs = headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()?;
    Some(Duration::from_secs(secs))
}

/// Compute the delay before the next retry attempt.
///
/// When `retry_after` is provided (e.g. from a 429 response), that value is
/// used directly but capped at `policy.max_delay`. Otherwise the delay follows
/// exponential backoff: `min(base_delay * 2^attempt + jitter, max_delay)`.
#[must_use]
pub fn delay_for_attempt(
    policy: &RetryPolicy,
    attempt: u32,
    retry_after: Option<Duration>,
) -> Duration {
    if let Some(ra) = retry_after {
        return ra.min(policy.max_delay);
    }

    let base = policy
        .base_delay
        .saturating_mul(2u32.saturating_pow(attempt));
    let base = base.min(policy.max_delay);

    // Derive a simple jitter from subsecond nanos of the system clock
    let jitter_nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();

    // Scale to 0-25% of the base delay
    let jitter_fraction = f64::from(jitter_nanos % 250) / 1000.0;
    let jitter = base.mul_f64(jitter_fraction);

    (base + jitter).min(policy.max_delay)
}

/// Send a request, retrying recoverable failures according to `policy`
///
/// Every attempt is bounded by `policy.attempt_timeout`. Non-recoverable
/// error statuses are returned as-is so the caller can read the body for its
/// own error message.
///
/// # Errors
///
/// Returns `Error::Timeout` if the last attempt timed out, otherwise the
/// transport error of the last attempt
pub async fn send_with_retry<F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut send: F,
) -> Result<reqwest::Response>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = reqwest::Result<reqwest::Response>>,
{
    let timed_out = || Error::Timeout {
        operation,
        after: policy.attempt_timeout,
    };
    let mut attempt = 0;

    loop {
        let can_retry = attempt < policy.max_retries;

        let retry_after = match tokio::time::timeout(policy.attempt_timeout, send()).await {
            Ok(Ok(response)) => {
                let status = response.status();
                if status.is_success() || !is_recoverable(status) || !can_retry {
                    return Ok(response);
                }
                tracing::warn!(operation, %status, attempt, "recoverable status, retrying");
                parse_retry_after(response.headers())
            }
            Ok(Err(e)) => {
                if !can_retry {
                    return Err(if e.is_timeout() { timed_out() } else { e.into() });
                }
                if !(e.is_timeout() || e.is_connect()) {
                    return Err(e.into());
                }
                tracing::warn!(operation, error = %e, attempt, "request failed, retrying");
                None
            }
            Err(_) => {
                if !can_retry {
                    return Err(timed_out());
                }
                tracing::warn!(operation, attempt, "attempt timed out, retrying");
                None
            }
        };

        tokio::time::sleep(delay_for_attempt(policy, attempt, retry_after)).await;
        attempt += 1;
    }
}
