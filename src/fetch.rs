//! Rate-limited HTTP fetching with exponential backoff retry logic.
//!
//! # Architecture
//!
//! - [`FetchAsync`]: core trait, one request for one URL returning the body
//! - [`HttpFetch`]: reqwest-backed implementation with headers and a timeout
//! - [`RetryFetch`]: decorator adding a [`RateLimiter`] and retries to any
//!   `FetchAsync`
//!
//! Every component that fetches takes the client by reference, so two
//! pipelines in one process each own their own limiter.
//!
//! # Retry Strategy
//!
//! - Up to `max_attempts` attempts in total
//! - Wait before attempt `n + 1`: `min(base_delay * 2^(n-1), max_delay)`,
//!   i.e. 1s, 2s, 4s, 8s, then 10s with the defaults
//! - Non-2xx statuses, timeouts and transport errors are all retryable

use crate::config::ScraperConfig;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderValue, USER_AGENT};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, instrument, warn};

/// Failure to fetch a URL.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to fetch {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::Status { url, .. }
            | FetchError::Timeout { url, .. }
            | FetchError::Transport { url, .. }
            | FetchError::Exhausted { url, .. } => url,
        }
    }

    /// HTTP status of the (last) failed response, if there was one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            FetchError::Exhausted { last, .. } => last.status_code(),
            FetchError::Timeout { .. } => None,
        }
    }
}

/// Trait for a single async page fetch.
pub trait FetchAsync {
    /// Fetch `url` and return the response body as text.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Enforces a minimum spacing between request starts.
///
/// The last start time is private state of one limiter; callers queue on the
/// lock, so concurrent futures sharing the limiter are spaced too.
pub struct RateLimiter {
    interval: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_start: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until `interval` has passed since the previous request started.
    pub async fn acquire(&self) {
        let mut last = self.last_start.lock().await;
        if let Some(prev) = *last {
            let since = prev.elapsed();
            if since < self.interval {
                let wait = self.interval - since;
                debug!(wait_ms = wait.as_millis() as u64, "Rate limiting");
                sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("interval", &self.interval)
            .finish()
    }
}

/// reqwest-backed [`FetchAsync`] with browser-like headers and a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpFetch {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetch {
    pub fn new(config: &ScraperConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        if let Ok(agent) = HeaderValue::from_str(&config.user_agent) {
            headers.insert(USER_AGENT, agent);
        } else {
            warn!(user_agent = %config.user_agent, "Ignoring invalid User-Agent header");
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            timeout: config.timeout(),
        })
    }
}

impl FetchAsync for HttpFetch {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    timeout: self.timeout,
                }
            } else {
                FetchError::Transport {
                    url: url.to_string(),
                    source: e,
                }
            }
        };

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(map_err)
    }
}

/// Wrapper that adds rate limiting and exponential backoff to any [`FetchAsync`].
///
/// ```text
/// delay before attempt n+1 = min(base_delay * 2^(n-1), max_delay)
/// ```
pub struct RetryFetch<T> {
    inner: T,
    limiter: RateLimiter,
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> RetryFetch<T>
where
    T: FetchAsync,
{
    /// Wrap `inner` with `max_attempts` tries (at least one) and a limiter of `rate_limit`.
    pub fn new(inner: T, max_attempts: u32, rate_limit: Duration) -> Self {
        Self {
            inner,
            limiter: RateLimiter::new(rate_limit),
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
        }
    }

    pub fn from_config(inner: T, config: &ScraperConfig) -> Self {
        Self::new(inner, config.retry_attempts, config.rate_limit())
    }

    /// Backoff to wait after failed attempt number `attempt` (1-based).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("limiter", &self.limiter)
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> FetchAsync for RetryFetch<T>
where
    T: FetchAsync,
{
    #[instrument(level = "info", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            self.limiter.acquire().await;
            debug!(attempt, max = self.max_attempts, "Fetching");

            let attempt_t0 = Instant::now();
            match self.inner.fetch(url).await {
                Ok(body) => {
                    info!(
                        attempt,
                        bytes = body.len(),
                        elapsed_ms = attempt_t0.elapsed().as_millis() as u64,
                        "Fetched"
                    );
                    return Ok(body);
                }
                Err(e) => {
                    if attempt >= self.max_attempts {
                        error!(
                            attempt,
                            max = self.max_attempts,
                            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                            error = %e,
                            "fetch() exhausted retries"
                        );
                        return Err(FetchError::Exhausted {
                            url: url.to_string(),
                            attempts: attempt,
                            last: Box::new(e),
                        });
                    }

                    let delay = self.backoff_delay(attempt);
                    warn!(
                        attempt,
                        max = self.max_attempts,
                        elapsed_ms_attempt = attempt_t0.elapsed().as_millis() as u64,
                        ?delay,
                        error = %e,
                        "fetch() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
