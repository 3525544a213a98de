use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Retry policy for fallible async operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryOptions {
    retries: usize,
    fixed_backoff: Option<Duration>,
    exponential_backoff: Option<Duration>,
    max_delay: Option<Duration>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryOptions {
    pub fn new() -> Self {
        Self {
            retries: 2,
            fixed_backoff: None,
            exponential_backoff: Some(Duration::from_millis(200)),
            max_delay: None,
        }
    }

    pub fn retries(mut self, count: usize) -> Self {
        self.retries = count;
        self
    }

    pub fn fixed_backoff(mut self, delay: Duration) -> Self {
        self.fixed_backoff = Some(delay);
        self
    }

    pub fn exponential_backoff(mut self, initial_delay: Duration) -> Self {
        self.exponential_backoff = Some(initial_delay);
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }
}

/// Runs `operation` until it succeeds, fails with an error `should_retry`
/// rejects, or the retry budget is spent.
pub async fn retry_async<F, Fut, T, E, P>(mut operation: F, options: RetryOptions, should_retry: P) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let RetryOptions {
        retries,
        fixed_backoff,
        exponential_backoff,
        max_delay,
    } = options;

    let mut attempt = 0;
    let mut delay = exponential_backoff.unwrap_or_default();
    let max_delay = max_delay.unwrap_or_else(|| Duration::from_secs(60));

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) if attempt <= retries && should_retry(&err) => {
                warn!("attempt {attempt} failed, retrying: {err}");
                if let Some(fixed) = fixed_backoff {
                    sleep(fixed).await;
                } else if delay > Duration::ZERO {
                    sleep(delay.min(max_delay)).await;
                    delay = (delay * 2).min(max_delay);
                }
            }
            Err(err) => return Err(err),
        }
    }
}
