use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Whether a failed attempt should be retried or treated as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retry,
    Stop,
}

#[derive(Debug)]
pub enum RetryError<E> {
    /// Classifier said this error is not worth retrying at all.
    Fatal(E),
    /// Classifier said retry, but `max_attempts` attempts were all consumed.
    AttemptsExceeded(E),
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub initial_delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: if max_delay.is_zero() { base_delay } else { max_delay },
        }
    }

    pub fn from_config(config: Option<&RetryConfig>) -> Self {
        match config {
            Some(cfg) => Self::new(
                cfg.max_attempts,
                Duration::from_millis(cfg.initial_delay_ms),
                Duration::from_secs(5),
            ),
            None => Self::default(),
        }
    }

    /// Runs `op` under this policy, re-invoking on retryable failure until
    /// `classify` says stop or attempts are exhausted. Never sleeps longer
    /// than `base_delay * 2^(max_attempts - 1)` (§8, invariant 6).
    pub async fn run<F, Fut, T, E, Classifier>(
        &self,
        mut op: F,
        classify: Classifier,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        Classifier: Fn(&E) -> RetryDisposition,
    {
        let mut attempt = 0;

        loop {
            match op().await {
                Ok(result) => return Ok(result),
                Err(err) => match classify(&err) {
                    RetryDisposition::Stop => return Err(RetryError::Fatal(err)),
                    RetryDisposition::Retry => {
                        if attempt + 1 >= self.max_attempts {
                            return Err(RetryError::AttemptsExceeded(err));
                        }
                        sleep(self.backoff_delay(attempt)).await;
                        attempt += 1;
                    }
                },
            }
        }
    }

    fn backoff_delay(&self, attempt: usize) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::from_millis(0);
        }
        let factor = 1u128 << attempt.min(6);
        let delay_ms = self.base_delay.as_millis().saturating_mul(factor);
        Duration::from_millis(delay_ms.min(self.max_delay.as_millis()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[derive(Debug, Clone)]
    struct TestError(&'static str);

    #[tokio::test]
    async fn retries_transient_failure_and_succeeds() {
        let policy = RetryPolicy::new(5, Duration::from_millis(0), Duration::from_millis(0));
        let attempts = Arc::new(AtomicUsize::new(0));
        let op_attempts = attempts.clone();

        let result = policy
            .run(
                move || {
                    let op_attempts = op_attempts.clone();
                    async move {
                        let attempt = op_attempts.fetch_add(1, Ordering::SeqCst);
                        if attempt < 2 {
                            Err(TestError("transient"))
                        } else {
                            Ok::<&'static str, TestError>("done")
                        }
                    }
                },
                |err: &TestError| match err.0 {
                    "transient" => RetryDisposition::Retry,
                    _ => RetryDisposition::Stop,
                },
            )
            .await;

        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_errors_never_retry() {
        let policy = RetryPolicy::new(5, Duration::from_millis(0), Duration::from_millis(0));
        let attempts = Arc::new(AtomicUsize::new(0));
        let op_attempts = attempts.clone();

        let result = policy
            .run(
                move || {
                    let op_attempts = op_attempts.clone();
                    async move {
                        op_attempts.fetch_add(1, Ordering::SeqCst);
                        Err::<(), TestError>(TestError("fatal"))
                    }
                },
                |_err: &TestError| RetryDisposition::Stop,
            )
            .await;

        assert!(matches!(result, Err(RetryError::Fatal(TestError("fatal")))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn permanent_failure_exhausts_retries() {
        let policy = RetryPolicy::new(3, Duration::from_millis(0), Duration::from_millis(0));
        let attempts = Arc::new(AtomicUsize::new(0));
        let op_attempts = attempts.clone();

        let result = policy
            .run(
                move || {
                    let op_attempts = op_attempts.clone();
                    async move {
                        op_attempts.fetch_add(1, Ordering::SeqCst);
                        Err::<(), TestError>(TestError("permanent"))
                    }
                },
                |_err: &TestError| RetryDisposition::Retry,
            )
            .await;

        match result {
            Err(RetryError::AttemptsExceeded(TestError(msg))) => assert_eq!(msg, "permanent"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
