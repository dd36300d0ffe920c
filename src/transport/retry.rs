// ABOUTME: Retry decorator for HttpSender with bounded exponential backoff.
// ABOUTME: Honors Retry-After on 429 and retries 502/503/504 and transport failures.

use super::error::TransportError;
use super::sender::{HttpRequest, HttpResponse, HttpSender};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use hyper::StatusCode;
use hyper::header::RETRY_AFTER;
use std::time::Duration;

/// Growth factor of the backoff curve. Kept well below 2.0 because the
/// service hands out short-lived 429s under normal multi-worker load.
const BACKOFF_FACTOR: f64 = 1.2;

/// Retry budget and delay ceiling for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_retries: u32,
    /// Upper bound for any single wait, backoff or Retry-After.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, max_delay: Duration) -> Self {
        Self {
            max_retries,
            max_delay,
        }
    }

    /// Number of attempts actually made. At least one request is always sent.
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 10,
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Exponential backoff for the given zero-based retry index:
/// `min(max_delay, round(1000 * (1.2^retry_index - 1))) ms`.
pub fn calculate_backoff(retry_index: u32, max_delay: Duration) -> Duration {
    let exponent = i32::try_from(retry_index).unwrap_or(i32::MAX);
    let delay_ms = ((BACKOFF_FACTOR.powi(exponent) - 1.0) * 1000.0).round();

    if delay_ms >= max_delay.as_millis() as f64 {
        max_delay
    } else {
        Duration::from_millis(delay_ms as u64)
    }
}

/// Parse a Retry-After header value, either delay-seconds or an HTTP-date,
/// capped at `max_delay`. Returns `None` when the value is empty or not
/// understood, in which case the caller falls back to backoff.
pub fn retry_after_delay(value: &str, max_delay: Duration, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let delay = if let Ok(seconds) = value.parse::<u64>() {
        Duration::from_secs(seconds)
    } else {
        let date = parse_http_date(value)?;
        // Dates in the past mean "retry now".
        (date - now).to_std().unwrap_or(Duration::ZERO)
    };

    Some(delay.min(max_delay))
}

/// Legacy HTTP-date layouts: RFC 850 and asctime. Both are always GMT.
const LEGACY_HTTP_DATE_FORMATS: [&str; 2] = ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"];

/// Parse an HTTP-date in the preferred IMF-fixdate form or either obsolete
/// form that HTTP/1.1 recipients must still accept.
fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }
    LEGACY_HTTP_DATE_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(value, format)
            .ok()
            .map(|date| date.and_utc())
    })
}

/// How a completed attempt should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Final,
    RateLimited,
    Unavailable,
}

fn classify(status: StatusCode) -> Verdict {
    match status {
        StatusCode::TOO_MANY_REQUESTS => Verdict::RateLimited,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            Verdict::Unavailable
        }
        _ => Verdict::Final,
    }
}

/// Wraps another sender and retries transient failures.
pub struct RetryingTransport<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: HttpSender> RetryingTransport<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn rate_limit_delay(&self, response: &HttpResponse, retry_index: u32) -> Duration {
        let header = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok());

        match header.and_then(|v| retry_after_delay(v, self.policy.max_delay, Utc::now())) {
            Some(delay) => {
                tracing::debug!("honoring Retry-After of {:?}", delay);
                delay
            }
            None => calculate_backoff(retry_index, self.policy.max_delay),
        }
    }
}

#[async_trait]
impl<S: HttpSender> HttpSender for RetryingTransport<S> {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let attempts = self.policy.attempts();
        let mut last_error = None;

        for retry_index in 0..attempts {
            let delay = match self.inner.send(request).await {
                Ok(response) => match classify(response.status()) {
                    Verdict::Final => return Ok(response),
                    Verdict::RateLimited => {
                        last_error = None;
                        self.rate_limit_delay(&response, retry_index)
                    }
                    Verdict::Unavailable => {
                        last_error = None;
                        calculate_backoff(retry_index, self.policy.max_delay)
                    }
                },
                Err(err) => {
                    tracing::debug!("attempt {} failed: {}", retry_index + 1, err);
                    last_error = Some(Box::new(err));
                    calculate_backoff(retry_index, self.policy.max_delay)
                }
            };

            if retry_index + 1 < attempts {
                tracing::debug!(
                    "retrying {} {} in {:?} (attempt {}/{})",
                    request.method(),
                    request.uri(),
                    delay,
                    retry_index + 2,
                    attempts
                );
                tokio::time::sleep(delay).await;
            }
        }

        tracing::warn!(
            "giving up on {} {} after {} attempt(s)",
            request.method(),
            request.uri(),
            attempts
        );
        Err(TransportError::MaxRetriesReached {
            attempts,
            last_error,
        })
    }
}
