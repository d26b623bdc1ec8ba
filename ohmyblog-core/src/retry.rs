//! Generic retry driver with exponential backoff, jitter and a per-attempt
//! timeout.
//!
//! The driver knows nothing about databases: callers supply the operation,
//! a predicate that classifies errors as retryable, and an observer that is
//! told about every attempt outcome (used for logging).
//!
//! A hung attempt is abandoned when its timeout fires: the attempt's future
//! is dropped, which cancels it at its next await point. Work that does not
//! yield (or I/O already handed to the OS) may still complete in the
//! background, so cancellation is best-effort.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio::time::Instant;

/// Upper bound of the random delay added to every backoff
pub const DEFAULT_JITTER: Duration = Duration::from_secs(1);

/// Immutable retry parameters.
///
/// Invariants: `max_attempts >= 1`, `max_wait >= initial_wait`,
/// `attempt_timeout > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_wait: Duration,
    max_wait: Duration,
    jitter: Duration,
    attempt_timeout: Duration,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RetryPolicyError {
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("max_wait ({max_wait:?}) is shorter than initial_wait ({initial_wait:?})")]
    InvertedWaits {
        initial_wait: Duration,
        max_wait: Duration,
    },

    #[error("attempt_timeout must be greater than zero")]
    ZeroTimeout,
}

impl RetryPolicy {
    /// Create a policy with [`DEFAULT_JITTER`].
    pub fn new(
        max_attempts: u32,
        initial_wait: Duration,
        max_wait: Duration,
        attempt_timeout: Duration,
    ) -> Result<Self, RetryPolicyError> {
        if max_attempts == 0 {
            return Err(RetryPolicyError::ZeroAttempts);
        }
        if max_wait < initial_wait {
            return Err(RetryPolicyError::InvertedWaits {
                initial_wait,
                max_wait,
            });
        }
        if attempt_timeout.is_zero() {
            return Err(RetryPolicyError::ZeroTimeout);
        }

        Ok(Self {
            max_attempts,
            initial_wait,
            max_wait,
            jitter: DEFAULT_JITTER,
            attempt_timeout,
        })
    }

    /// One attempt, no backoff: any failure is terminal.
    pub fn single_attempt(attempt_timeout: Duration) -> Self {
        Self {
            max_attempts: 1,
            initial_wait: Duration::ZERO,
            max_wait: Duration::ZERO,
            jitter: Duration::ZERO,
            attempt_timeout,
        }
    }

    /// Replace the jitter bound. `Duration::ZERO` makes backoff deterministic.
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn initial_wait(&self) -> Duration {
        self.initial_wait
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    pub fn jitter(&self) -> Duration {
        self.jitter
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Jitter-free delay after failed attempt `attempt` (1-based):
    /// `initial_wait * 2^(attempt - 1)`, capped at `max_wait`.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        self.exponential(attempt).min(self.max_wait)
    }

    /// Delay after failed attempt `attempt` (1-based), jitter included and
    /// capped at `max_wait`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_with(attempt, &mut rand::thread_rng())
    }

    /// [`RetryPolicy::backoff`] with a caller-supplied random source.
    pub fn backoff_with<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let jitter = if self.jitter.is_zero() {
            Duration::ZERO
        } else {
            self.jitter.mul_f64(rng.gen::<f64>())
        };
        self.exponential(attempt)
            .saturating_add(jitter)
            .min(self.max_wait)
    }

    fn exponential(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        self.initial_wait
            .checked_mul(1u32 << exp)
            .unwrap_or(Duration::MAX)
    }
}

/// Why a single attempt did not succeed
#[derive(Debug, Error)]
pub enum AttemptFailure<E> {
    #[error("attempt timed out after {0:?}")]
    TimedOut(Duration),

    #[error(transparent)]
    Failed(E),
}

/// Terminal outcome of [`retry`]
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error or timed out
    #[error("gave up after {attempts} attempt(s): {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: AttemptFailure<E>,
    },

    /// An attempt failed with an error the predicate refused to retry
    #[error("attempt {attempt} failed and is not retryable: {source}")]
    Fatal {
        attempt: u32,
        #[source]
        source: E,
    },
}

impl<E> RetryError<E> {
    /// Number of attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } => *attempts,
            Self::Fatal { attempt, .. } => *attempt,
        }
    }

    /// Whether the last attempt ended in a timeout.
    pub fn timed_out(&self) -> bool {
        matches!(
            self,
            Self::Exhausted {
                last: AttemptFailure::TimedOut(_),
                ..
            }
        )
    }
}

/// Successful outcome of [`retry`]
#[derive(Debug, Clone, PartialEq)]
pub struct Retried<T> {
    pub value: T,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Outcome of one attempt, reported to the observer.
///
/// `next_wait` is the backoff that follows, or `None` when the driver is
/// about to give up.
#[derive(Debug)]
pub enum AttemptEvent<'a, E> {
    Succeeded {
        attempt: u32,
    },
    TimedOut {
        attempt: u32,
        timeout: Duration,
        next_wait: Option<Duration>,
    },
    Failed {
        attempt: u32,
        error: &'a E,
        retryable: bool,
        next_wait: Option<Duration>,
    },
}

impl<E> AttemptEvent<'_, E> {
    pub fn attempt(&self) -> u32 {
        match self {
            Self::Succeeded { attempt }
            | Self::TimedOut { attempt, .. }
            | Self::Failed { attempt, .. } => *attempt,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Run `operation` under `policy`.
///
/// `operation` receives the 1-based attempt number. Timeouts are always
/// retryable; errors are retried only when `is_retryable` returns true.
pub async fn retry<T, E, Op, Fut, P, H>(
    policy: &RetryPolicy,
    is_retryable: P,
    mut on_event: H,
    mut operation: Op,
) -> Result<Retried<T>, RetryError<E>>
where
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    H: FnMut(&AttemptEvent<'_, E>),
{
    let started = Instant::now();
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let failure = match tokio::time::timeout(policy.attempt_timeout, operation(attempt)).await {
            Ok(Ok(value)) => {
                on_event(&AttemptEvent::Succeeded { attempt });
                return Ok(Retried {
                    value,
                    attempts: attempt,
                    elapsed: started.elapsed(),
                });
            }
            Ok(Err(error)) if !is_retryable(&error) => {
                on_event(&AttemptEvent::Failed {
                    attempt,
                    error: &error,
                    retryable: false,
                    next_wait: None,
                });
                return Err(RetryError::Fatal {
                    attempt,
                    source: error,
                });
            }
            Ok(Err(error)) => AttemptFailure::Failed(error),
            Err(_elapsed) => AttemptFailure::TimedOut(policy.attempt_timeout),
        };

        let next_wait = (attempt < policy.max_attempts).then(|| policy.backoff(attempt));
        match &failure {
            AttemptFailure::TimedOut(timeout) => on_event(&AttemptEvent::TimedOut {
                attempt,
                timeout: *timeout,
                next_wait,
            }),
            AttemptFailure::Failed(error) => on_event(&AttemptEvent::Failed {
                attempt,
                error,
                retryable: true,
                next_wait,
            }),
        }

        match next_wait {
            Some(wait) => tokio::time::sleep(wait).await,
            None => {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: failure,
                })
            }
        }
    }
}
