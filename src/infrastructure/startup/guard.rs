//! Startup guard
//!
//! Blocks a service's readiness until its store can be reached and its schema
//! applied, retrying a fixed number of times with a fixed delay between
//! attempts. Exhausting the attempts is terminal.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::domain::DomainError;

/// Retry policy for the startup guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupPolicy {
    /// Total number of attempts, including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Pause between a failed attempt and the next one
    pub retry_delay: Duration,
}

impl Default for StartupPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            retry_delay: Duration::from_secs(5),
        }
    }
}

impl StartupPolicy {
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts,
            retry_delay,
        }
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Guard state machine: `Probing -> Ready` or `Probing -> Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Probing { attempt: u32 },
    Ready { attempts: u32 },
    Failed { attempts: u32 },
}

/// Details of one failed probe, handed to the observer before the guard sleeps
#[derive(Debug)]
pub struct AttemptFailure<'a> {
    pub target: &'a str,
    pub attempt: u32,
    pub max_attempts: u32,
    pub error: &'a DomainError,
}

/// Observability hook for the guard
pub trait StartupObserver: Send + Sync {
    fn on_attempt_failed(&self, failure: &AttemptFailure<'_>);

    fn on_state_change(&self, _target: &str, _state: GuardState) {}
}

/// Default observer that reports through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl StartupObserver for TracingObserver {
    fn on_attempt_failed(&self, failure: &AttemptFailure<'_>) {
        warn!(
            target_store = failure.target,
            attempt = failure.attempt,
            max_attempts = failure.max_attempts,
            error = %failure.error,
            "Store not ready, retrying"
        );
    }

    fn on_state_change(&self, target: &str, state: GuardState) {
        match state {
            GuardState::Probing { .. } => {}
            GuardState::Ready { attempts } => {
                info!(target_store = target, attempts, "Store connected and schema applied");
            }
            GuardState::Failed { attempts } => {
                error!(target_store = target, attempts, "Store not available after retries");
            }
        }
    }
}

/// Bounded-retry guard around a store's connect-and-migrate step
#[derive(Clone)]
pub struct StartupGuard {
    target: String,
    policy: StartupPolicy,
    observer: Arc<dyn StartupObserver>,
}

impl std::fmt::Debug for StartupGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartupGuard")
            .field("target", &self.target)
            .field("policy", &self.policy)
            .finish()
    }
}

impl StartupGuard {
    /// Create a guard for the named store, reporting through `tracing`
    pub fn new(target: impl Into<String>, policy: StartupPolicy) -> Self {
        Self {
            target: target.into(),
            policy,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn StartupObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn policy(&self) -> &StartupPolicy {
        &self.policy
    }

    /// Runs `probe` until it succeeds or the attempts are exhausted.
    ///
    /// Every failed attempt is reported before sleeping; there is no sleep after
    /// the last one. Exhaustion yields `DomainError::StoreUnavailable` carrying
    /// the final probe error.
    pub async fn run<T, F, Fut>(&self, mut probe: F) -> Result<T, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let max_attempts = self.policy.attempts();
        let mut attempt = 1;

        loop {
            self.observer
                .on_state_change(&self.target, GuardState::Probing { attempt });

            match probe().await {
                Ok(value) => {
                    self.observer
                        .on_state_change(&self.target, GuardState::Ready { attempts: attempt });
                    return Ok(value);
                }
                Err(e) => {
                    self.observer.on_attempt_failed(&AttemptFailure {
                        target: &self.target,
                        attempt,
                        max_attempts,
                        error: &e,
                    });

                    if attempt >= max_attempts {
                        self.observer
                            .on_state_change(&self.target, GuardState::Failed { attempts: attempt });
                        return Err(DomainError::store_unavailable(attempt, e.to_string()));
                    }
                }
            }

            tokio::time::sleep(self.policy.retry_delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[derive(Default)]
    struct RecordingObserver {
        failures: Mutex<Vec<u32>>,
        states: Mutex<Vec<GuardState>>,
    }

    impl StartupObserver for RecordingObserver {
        fn on_attempt_failed(&self, failure: &AttemptFailure<'_>) {
            self.failures.lock().unwrap().push(failure.attempt);
        }

        fn on_state_change(&self, _target: &str, state: GuardState) {
            self.states.lock().unwrap().push(state);
        }
    }

    fn guard(max_attempts: u32, observer: Arc<RecordingObserver>) -> StartupGuard {
        StartupGuard::new("test-store", StartupPolicy::new(max_attempts, Duration::from_secs(5)))
            .with_observer(observer)
    }

    #[test]
    fn test_default_policy() {
        let policy = StartupPolicy::default();
        assert_eq!(policy.max_attempts, 10);
        assert_eq!(policy.retry_delay, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_stops_after_max_attempts() {
        let observer = Arc::new(RecordingObserver::default());
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result: Result<(), DomainError> = guard(3, observer.clone())
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(DomainError::storage("connection refused")) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            result,
            Err(DomainError::StoreUnavailable { attempts: 3, .. })
        ));
        assert_eq!(*observer.failures.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(
            observer.states.lock().unwrap().last(),
            Some(&GuardState::Failed { attempts: 3 })
        );
        // two sleeps between three attempts, none after the last
        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_after_transient_failures() {
        let observer = Arc::new(RecordingObserver::default());
        let calls = AtomicU32::new(0);

        let result = guard(10, observer.clone())
            .run(|| {
                let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if attempt < 3 {
                        Err(DomainError::storage("not yet"))
                    } else {
                        Ok("connected")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "connected");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(*observer.failures.lock().unwrap(), vec![1, 2]);
        assert_eq!(
            observer.states.lock().unwrap().last(),
            Some(&GuardState::Ready { attempts: 3 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success_does_not_sleep() {
        let observer = Arc::new(RecordingObserver::default());
        let started = Instant::now();

        let result = guard(5, observer.clone())
            .run(|| async { Ok::<_, DomainError>(7) })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert!(observer.failures.lock().unwrap().is_empty());
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_probes_once() {
        let observer = Arc::new(RecordingObserver::default());
        let calls = AtomicU32::new(0);

        let result: Result<(), DomainError> = guard(0, observer)
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(DomainError::storage("down")) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result,
            Err(DomainError::StoreUnavailable { attempts: 1, .. })
        ));
    }
}
