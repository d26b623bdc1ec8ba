//! Startup connectivity check with bounded retries.
//!
//! The bootstrapper walks `NotStarted -> Probing -> Succeeded | Failed`
//! exactly once. Each probe attempt runs under the policy's per-attempt
//! timeout; transient failures are retried with exponential backoff plus
//! jitter, anything else aborts immediately. A hung attempt is abandoned by
//! dropping its future, which stops waiting but may not interrupt the
//! underlying connect on every platform.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use ohmyblog_core::{retry, AttemptEvent, RetryError, RetryPolicy};
use sqlx::PgPool;
use thiserror::Error;

use super::pool::is_retryable;

/// A single liveness check against the database
#[async_trait]
pub trait Probe: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn probe(&self) -> Result<(), Self::Error>;

    /// Whether `error` is transient and worth another attempt.
    fn is_retryable(&self, error: &Self::Error) -> bool;
}

/// Acquires a pooled connection and runs `SELECT 1`
#[derive(Debug, Clone)]
pub struct PgProbe {
    pool: PgPool,
}

impl PgProbe {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Probe for PgProbe {
    type Error = sqlx::Error;

    async fn probe(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_retryable(&self, error: &sqlx::Error) -> bool {
        is_retryable(error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    NotStarted,
    Probing { attempt: u32 },
    Succeeded,
    Failed,
}

impl fmt::Display for BootstrapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => f.write_str("not started"),
            Self::Probing { attempt } => write!(f, "probing (attempt {attempt})"),
            Self::Succeeded => f.write_str("succeeded"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// What happened on one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded,
    TimedOut,
    Failed { retryable: bool, message: String },
}

/// Summary of a successful bootstrap
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapReport {
    pub attempts: u32,
    pub elapsed: Duration,
}

#[derive(Debug, Error)]
pub enum BootstrapError<E>
where
    E: std::error::Error + 'static,
{
    #[error("database at {target} is unavailable: {source}")]
    Unavailable {
        target: String,
        #[source]
        source: RetryError<E>,
    },

    #[error("bootstrap cannot run again, it already {0}")]
    AlreadyRan(BootstrapState),
}

impl<E> BootstrapError<E>
where
    E: std::error::Error + 'static,
{
    /// Attempts made before failing, zero when the run was refused.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Unavailable { source, .. } => source.attempts(),
            Self::AlreadyRan(_) => 0,
        }
    }
}

/// Drives a [`Probe`] under a [`RetryPolicy`].
pub struct Bootstrapper<P> {
    probe: P,
    policy: RetryPolicy,
    target: String,
    state: BootstrapState,
    history: Vec<AttemptOutcome>,
}

impl<P: Probe> Bootstrapper<P> {
    /// `target` names the database in logs and must not contain secrets.
    pub fn new(probe: P, policy: RetryPolicy, target: impl Into<String>) -> Self {
        Self {
            probe,
            policy,
            target: target.into(),
            state: BootstrapState::NotStarted,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    /// One entry per attempt made so far.
    pub fn history(&self) -> &[AttemptOutcome] {
        &self.history
    }

    /// Probe until success, a fatal error or an exhausted budget.
    pub async fn run(&mut self) -> Result<BootstrapReport, BootstrapError<P::Error>> {
        if self.state != BootstrapState::NotStarted {
            return Err(BootstrapError::AlreadyRan(self.state));
        }

        let Self {
            probe,
            policy,
            target,
            state,
            history,
        } = self;
        let (probe, policy, target) = (&*probe, &*policy, target.as_str());

        tracing::info!(
            target_db = %target,
            max_attempts = policy.max_attempts(),
            attempt_timeout = ?policy.attempt_timeout(),
            "checking database connectivity"
        );
        *state = BootstrapState::Probing { attempt: 1 };

        let outcome = retry(
            policy,
            |error| probe.is_retryable(error),
            |event| {
                history.push(record(event, target, policy.max_attempts()));
                if let Some(next_wait) = next_wait(event) {
                    *state = BootstrapState::Probing {
                        attempt: event.attempt() + 1,
                    };
                    tracing::debug!(?next_wait, "waiting before next attempt");
                }
            },
            |_attempt| probe.probe(),
        )
        .await;

        match outcome {
            Ok(done) => {
                *state = BootstrapState::Succeeded;
                tracing::info!(
                    target_db = %target,
                    attempts = done.attempts,
                    elapsed = ?done.elapsed,
                    "database is reachable"
                );
                Ok(BootstrapReport {
                    attempts: done.attempts,
                    elapsed: done.elapsed,
                })
            }
            Err(source) => {
                *state = BootstrapState::Failed;
                tracing::error!(
                    target_db = %target,
                    attempts = source.attempts(),
                    error = %source,
                    "giving up on database"
                );
                Err(BootstrapError::Unavailable {
                    target: target.to_owned(),
                    source,
                })
            }
        }
    }
}

fn next_wait<E>(event: &AttemptEvent<'_, E>) -> Option<Duration> {
    match event {
        AttemptEvent::Succeeded { .. } => None,
        AttemptEvent::TimedOut { next_wait, .. } | AttemptEvent::Failed { next_wait, .. } => {
            *next_wait
        }
    }
}

/// Log one attempt and turn it into a history entry.
fn record<E: std::error::Error>(
    event: &AttemptEvent<'_, E>,
    target: &str,
    max_attempts: u32,
) -> AttemptOutcome {
    match event {
        AttemptEvent::Succeeded { attempt } => {
            tracing::info!(target_db = %target, attempt, max_attempts, "database probe succeeded");
            AttemptOutcome::Succeeded
        }
        AttemptEvent::TimedOut {
            attempt, timeout, ..
        } => {
            tracing::warn!(
                target_db = %target,
                attempt,
                max_attempts,
                ?timeout,
                "database probe timed out"
            );
            AttemptOutcome::TimedOut
        }
        AttemptEvent::Failed {
            attempt,
            error,
            retryable,
            ..
        } => {
            if *retryable {
                tracing::warn!(
                    target_db = %target,
                    attempt,
                    max_attempts,
                    error = %error,
                    "database probe failed"
                );
            } else {
                tracing::error!(
                    target_db = %target,
                    attempt,
                    error = %error,
                    "database probe failed with a non-retryable error"
                );
            }
            AttemptOutcome::Failed {
                retryable: *retryable,
                message: error.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Error)]
    enum FakeError {
        #[error("connection refused")]
        Refused,
        #[error("password authentication failed")]
        Auth,
    }

    #[derive(Debug, Clone, Copy)]
    enum Step {
        Ok,
        Fail,
        Deny,
        Hang,
    }

    /// Plays back a fixed script; repeats the last step once exhausted
    struct ScriptedProbe {
        script: Mutex<VecDeque<Step>>,
        calls: AtomicU32,
    }

    impl ScriptedProbe {
        fn new(steps: &[Step]) -> Self {
            Self {
                script: Mutex::new(steps.iter().copied().collect()),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl<'a> Probe for &'a ScriptedProbe {
        type Error = FakeError;

        async fn probe(&self) -> Result<(), FakeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let step = {
                let mut script = self.script.lock().unwrap();
                if script.len() > 1 {
                    script.pop_front().unwrap()
                } else {
                    *script.front().unwrap()
                }
            };
            match step {
                Step::Ok => Ok(()),
                Step::Fail => Err(FakeError::Refused),
                Step::Deny => Err(FakeError::Auth),
                Step::Hang => std::future::pending().await,
            }
        }

        fn is_retryable(&self, error: &FakeError) -> bool {
            matches!(error, FakeError::Refused)
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(
            max_attempts,
            Duration::from_secs(1),
            Duration::from_secs(20),
            Duration::from_secs(10),
        )
        .unwrap()
    }

    fn warnings(history: &[AttemptOutcome]) -> usize {
        history
            .iter()
            .filter(|o| {
                matches!(
                    o,
                    AttemptOutcome::TimedOut | AttemptOutcome::Failed { retryable: true, .. }
                )
            })
            .count()
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_third_attempt() {
        let probe = ScriptedProbe::new(&[Step::Fail, Step::Fail, Step::Ok]);
        let policy = policy(3);
        let mut boot = Bootstrapper::new(&probe, policy, "postgres@localhost:5432/test");
        assert_eq!(boot.state(), BootstrapState::NotStarted);

        let report = boot.run().await.expect("bootstrap should succeed");

        assert_eq!(report.attempts, 3);
        assert_eq!(probe.calls(), 3);
        assert_eq!(boot.state(), BootstrapState::Succeeded);
        assert_eq!(warnings(boot.history()), 2);
        assert_eq!(boot.history().last(), Some(&AttemptOutcome::Succeeded));

        // two backoffs: 1s + 2s of base delay, each with up to 1s of jitter
        assert!(report.elapsed >= policy.initial_wait());
        assert!(report.elapsed <= policy.max_wait() * 2 + policy.jitter() * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_retry_fails_after_one_attempt() {
        let probe = ScriptedProbe::new(&[Step::Fail, Step::Ok]);
        let mut boot = Bootstrapper::new(
            &probe,
            RetryPolicy::single_attempt(Duration::from_secs(10)),
            "db",
        );

        let err = boot.run().await.unwrap_err();

        assert_eq!(err.attempts(), 1);
        assert_eq!(probe.calls(), 1);
        assert_eq!(boot.state(), BootstrapState::Failed);
        assert!(matches!(
            err,
            BootstrapError::Unavailable {
                source: RetryError::Exhausted { attempts: 1, .. },
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn always_hanging_probe_times_out_twice() {
        let probe = ScriptedProbe::new(&[Step::Hang]);
        let policy = policy(2).with_jitter(Duration::ZERO);
        let started = tokio::time::Instant::now();
        let mut boot = Bootstrapper::new(&probe, policy, "db");

        let err = boot.run().await.unwrap_err();

        assert_eq!(probe.calls(), 2);
        assert_eq!(boot.history(), &[AttemptOutcome::TimedOut, AttemptOutcome::TimedOut]);
        match &err {
            BootstrapError::Unavailable { source, .. } => assert!(source.timed_out()),
            other => panic!("unexpected error: {other}"),
        }
        // two 10s timeouts plus exactly one 1s backoff
        assert_eq!(started.elapsed(), Duration::from_secs(21));
    }

    #[tokio::test(start_paused = true)]
    async fn auth_failure_is_not_retried() {
        let probe = ScriptedProbe::new(&[Step::Deny, Step::Ok]);
        let mut boot = Bootstrapper::new(&probe, policy(6), "db");

        let err = boot.run().await.unwrap_err();

        assert_eq!(probe.calls(), 1);
        assert!(matches!(
            err,
            BootstrapError::Unavailable {
                source: RetryError::Fatal { attempt: 1, .. },
                ..
            }
        ));
        assert_eq!(
            boot.history(),
            &[AttemptOutcome::Failed {
                retryable: false,
                message: "password authentication failed".into()
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn runs_only_once() {
        let probe = ScriptedProbe::new(&[Step::Ok]);
        let mut boot = Bootstrapper::new(&probe, policy(3), "db");
        boot.run().await.unwrap();

        let again = boot.run().await.unwrap_err();
        assert!(matches!(again, BootstrapError::AlreadyRan(BootstrapState::Succeeded)));
        assert_eq!(probe.calls(), 1);
    }

    #[test]
    fn state_display() {
        assert_eq!(BootstrapState::Probing { attempt: 2 }.to_string(), "probing (attempt 2)");
        assert_eq!(
            BootstrapError::<FakeError>::AlreadyRan(BootstrapState::Failed).to_string(),
            "bootstrap cannot run again, it already failed"
        );
    }
}
