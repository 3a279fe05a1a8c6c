use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Exponential backoff for transient model failures.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub enabled: bool,
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn disabled() -> Self {
        Self { enabled: false, ..Self::default() }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    fn next_delay(&self, current: Duration) -> Duration {
        let scaled = current.as_secs_f64() * f64::from(self.backoff_multiplier.max(1.0));
        Duration::from_secs_f64(scaled).min(self.max_delay)
    }

    /// The wait before the next attempt: the server's hint when it gave one,
    /// otherwise the backoff schedule. Never longer than `max_delay`.
    fn wait_for(&self, decision: RetryDecision, backoff: Duration) -> Duration {
        match decision {
            RetryDecision::RetryAfter(hint) => hint.min(self.max_delay),
            _ => backoff,
        }
    }
}

/// How a failed attempt should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Permanent; surface the error.
    GiveUp,
    /// Transient; wait on the backoff schedule.
    Retry,
    /// Transient, and the server asked for this wait.
    RetryAfter(Duration),
}

impl RetryDecision {
    pub fn is_retryable(self) -> bool {
        !matches!(self, Self::GiveUp)
    }
}

/// Request timeouts, throttling, and server-side failures.
#[must_use]
pub fn is_retryable_status_code(status_code: u16) -> bool {
    matches!(status_code, 408 | 429 | 500 | 502 | 503 | 504)
}

/// Google RPC status names that mark a transient failure.
#[must_use]
pub fn is_retryable_rpc_status(status: &str) -> bool {
    matches!(
        status,
        "RESOURCE_EXHAUSTED" | "UNAVAILABLE" | "DEADLINE_EXCEEDED" | "INTERNAL" | "ABORTED"
    )
}

/// Parses a protobuf duration string such as `"30s"` or `"1.5s"`.
pub fn parse_retry_delay(raw: &str) -> Option<Duration> {
    let seconds: f64 = raw.trim().strip_suffix('s')?.parse().ok()?;
    (seconds.is_finite() && seconds >= 0.0).then(|| Duration::from_secs_f64(seconds))
}

pub async fn execute_with_retry<T, E, Op, Fut, Classify>(
    config: &RetryConfig,
    classify: Classify,
    mut operation: Op,
) -> std::result::Result<T, E>
where
    E: Display,
    Op: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    Classify: Fn(&E) -> RetryDecision,
{
    if !config.enabled {
        return operation().await;
    }

    let mut attempt: u32 = 0;
    let mut backoff = config.initial_delay;
    loop {
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };
        let decision = classify(&error);
        if attempt >= config.max_retries || !decision.is_retryable() {
            return Err(error);
        }
        attempt += 1;
        let wait = config.wait_for(decision, backoff);
        warn!(
            attempt,
            max_retries = config.max_retries,
            delay_ms = wait.as_millis() as u64,
            error = %error,
            "model request failed with a retryable error; retrying"
        );
        tokio::time::sleep(wait).await;
        backoff = config.next_delay(backoff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct Status(u16);

    impl Display for Status {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "HTTP {}", self.0)
        }
    }

    fn by_status(error: &Status) -> RetryDecision {
        if is_retryable_status_code(error.0) { RetryDecision::Retry } else { RetryDecision::GiveUp }
    }

    fn instant() -> RetryConfig {
        RetryConfig::default().with_initial_delay(Duration::ZERO).with_max_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn retries_retryable_errors_until_success() {
        let attempts = Arc::new(AtomicU32::new(0));
        let config = instant().with_max_retries(2);
        let result = execute_with_retry(&config, by_status, || {
            let attempts = Arc::clone(&attempts);
            async move {
                match attempts.fetch_add(1, Ordering::SeqCst) {
                    0 => Err(Status(503)),
                    1 => Err(Status(429)),
                    _ => Ok("ok"),
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, "ok");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let attempts = Arc::new(AtomicU32::new(0));
        let err = execute_with_retry(&instant().with_max_retries(2), by_status, || {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Status(502))
            }
        })
        .await
        .unwrap_err();

        assert_eq!(err.0, 502);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_on_non_retryable_error() {
        let attempts = Arc::new(AtomicU32::new(0));
        let err = execute_with_retry(&instant(), by_status, || {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Status(400))
            }
        })
        .await
        .unwrap_err();

        assert_eq!(err.0, 400);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn disabled_config_runs_once() {
        let attempts = Arc::new(AtomicU32::new(0));
        let _ = execute_with_retry(&RetryConfig::disabled(), by_status, || {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Status(503))
            }
        })
        .await;
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn server_hint_sets_the_wait() {
        let config =
            RetryConfig::default().with_max_retries(1).with_max_delay(Duration::from_secs(5));
        let started = tokio::time::Instant::now();
        let attempts = Arc::new(AtomicU32::new(0));
        let result = execute_with_retry(
            &config,
            |_: &Status| RetryDecision::RetryAfter(Duration::from_secs(30)),
            || {
                let attempts = Arc::clone(&attempts);
                async move {
                    match attempts.fetch_add(1, Ordering::SeqCst) {
                        0 => Err(Status(429)),
                        _ => Ok(()),
                    }
                }
            },
        )
        .await;

        assert!(result.is_ok());
        // 30s hint capped by max_delay
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[test]
    fn delay_is_capped() {
        let config = RetryConfig::default();
        assert_eq!(config.next_delay(Duration::from_secs(6)), Duration::from_secs(8));
    }

    #[test]
    fn classifies_statuses() {
        for code in [408, 429, 500, 502, 503, 504] {
            assert!(is_retryable_status_code(code), "{code}");
        }
        assert!(!is_retryable_status_code(400));
        assert!(!is_retryable_status_code(404));
        assert!(is_retryable_rpc_status("UNAVAILABLE"));
        assert!(!is_retryable_rpc_status("INVALID_ARGUMENT"));
    }

    #[test]
    fn parses_protobuf_durations() {
        assert_eq!(parse_retry_delay("30s"), Some(Duration::from_secs(30)));
        assert_eq!(parse_retry_delay("1.5s"), Some(Duration::from_millis(1500)));
        assert_eq!(parse_retry_delay("soon"), None);
        assert_eq!(parse_retry_delay("-1s"), None);
    }
}
