// crates/loadgate-core/src/runtime/poller.rs
// ============================================================================
// Module: Load Gate Completion Poller
// Description: Bounded status polling until a remote run reaches a terminal state.
// Purpose: Wait for run completion without trusting the remote to ever finish.
// Dependencies: crate::{core, interfaces}, thiserror
// ============================================================================

//! ## Overview
//! The poller fetches run status every `interval` until the run completes.
//! Once the run has declared a duration, the wait is capped at that duration
//! plus a grace margin; a run that has not declared one is not capped. After
//! completion the poller waits a fixed settle delay so the remote aggregation
//! catches up before summary metrics are read.
//!
//! Invariants:
//! - A failed or malformed status fetch is terminal (`ApiError`) unless an
//!   explicit [`RetryPolicy`] allows retries of transient failures.
//! - Elapsed time is counted from the waits the poller performs, not from the
//!   wall clock, so simulated sleepers give exact timings.
//! - Cancellation during any wait unwinds immediately with no further remote
//!   calls.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use thiserror::Error;

use crate::core::PollState;
use crate::core::RunId;
use crate::core::RunState;
use crate::core::RunStatus;
use crate::core::SecretKey;
use crate::core::TestId;
use crate::interfaces::ClientError;
use crate::interfaces::GateEvent;
use crate::interfaces::GateLog;
use crate::interfaces::GateStage;
use crate::interfaces::LogLevel;
use crate::interfaces::MetricsClient;
use crate::interfaces::Sleeper;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default interval between status fetches.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Default grace margin beyond the declared run duration.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(60);
/// Default delay between completion and the summary fetch.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(10);

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Opt-in retry of transient status-fetch failures.
///
/// # Invariants
/// - `max_retries == 0` keeps every fetch failure terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum consecutive retries of one status fetch.
    pub max_retries: u32,
    /// Backoff before the first retry.
    pub initial_backoff: Duration,
    /// Backoff multiplier applied after each retry.
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::from_secs(1),
            multiplier: 2,
        }
    }
}

/// Timing policy for the completion poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Interval between status fetches.
    pub interval: Duration,
    /// Grace margin beyond the declared run duration.
    pub grace: Duration,
    /// Delay after completion before the summary fetch.
    pub settle_delay: Duration,
    /// Retry behavior for transient fetch failures.
    pub retry: RetryPolicy,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            grace: DEFAULT_GRACE,
            settle_delay: DEFAULT_SETTLE_DELAY,
            retry: RetryPolicy::default(),
        }
    }
}

// ============================================================================
// SECTION: Results
// ============================================================================

/// Successful completion of a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    /// Final status snapshot (state `Complete`).
    pub status: RunStatus,
    /// Number of status fetches issued, retries included.
    pub fetches: u32,
    /// Waiting time accumulated before completion, settle delay excluded.
    pub elapsed: Duration,
}

/// Terminal poll failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    /// Run exceeded its declared duration plus the grace margin.
    #[error("run did not complete within {ceiling_sec}s (waited {elapsed_sec}s)")]
    TimedOut {
        /// Seconds waited.
        elapsed_sec: u64,
        /// Allowed ceiling in seconds.
        ceiling_sec: u64,
    },
    /// Status fetch failed or returned a malformed payload.
    #[error("run status unavailable: {0}")]
    Api(ClientError),
    /// Wait was interrupted by cancellation.
    #[error("polling cancelled")]
    Cancelled,
}

impl PollError {
    /// Returns the terminal poller state for this failure, if any.
    #[must_use]
    pub const fn state(&self) -> Option<PollState> {
        match self {
            Self::TimedOut {
                ..
            } => Some(PollState::TimedOut),
            Self::Api(_) => Some(PollState::ApiError),
            Self::Cancelled => None,
        }
    }
}

// ============================================================================
// SECTION: Poller
// ============================================================================

/// Completion poller for one run.
pub struct CompletionPoller<'a, M: MetricsClient + ?Sized, S: Sleeper + ?Sized> {
    /// Client used for status fetches.
    client: &'a M,
    /// Sleeper used for every wait.
    sleeper: &'a S,
    /// Timing policy.
    policy: PollPolicy,
    /// Log sink for state transitions.
    log: &'a dyn GateLog,
}

impl<'a, M: MetricsClient + ?Sized, S: Sleeper + ?Sized> CompletionPoller<'a, M, S> {
    /// Creates a poller.
    #[must_use]
    pub const fn new(
        client: &'a M,
        sleeper: &'a S,
        policy: PollPolicy,
        log: &'a dyn GateLog,
    ) -> Self {
        Self {
            client,
            sleeper,
            policy,
            log,
        }
    }

    /// Polls until the run completes, then waits the settle delay.
    ///
    /// # Errors
    ///
    /// Returns [`PollError`] on timeout, fetch failure, or cancellation.
    pub fn wait_for_completion(
        &self,
        test_id: &TestId,
        run_id: &RunId,
        key: &SecretKey,
    ) -> Result<PollReport, PollError> {
        let mut elapsed = Duration::ZERO;
        let mut fetches = 0_u32;
        let mut last_state: Option<PollState> = None;
        loop {
            if self.sleeper.is_cancelled() {
                return Err(PollError::Cancelled);
            }
            let status = match self.fetch_status(test_id, run_id, key, &mut elapsed, &mut fetches)
            {
                Ok(status) => status,
                Err(err) => {
                    if let Some(state) = err.state() {
                        self.log_transition(test_id, run_id, &mut last_state, state, &err.to_string());
                    }
                    return Err(err);
                }
            };
            match status.state {
                state if state.is_in_flight() => {
                    let state = PollState::from(state);
                    self.log_transition(test_id, run_id, &mut last_state, state, "run in flight");
                    if status.declared_duration_sec > 0 {
                        let ceiling = Duration::from_secs(status.declared_duration_sec)
                            .saturating_add(self.policy.grace);
                        if elapsed > ceiling {
                            let err = PollError::TimedOut {
                                elapsed_sec: elapsed.as_secs(),
                                ceiling_sec: ceiling.as_secs(),
                            };
                            self.log_transition(
                                test_id,
                                run_id,
                                &mut last_state,
                                PollState::TimedOut,
                                &err.to_string(),
                            );
                            return Err(err);
                        }
                    }
                    self.sleeper.sleep(self.policy.interval).map_err(|_| PollError::Cancelled)?;
                    elapsed = elapsed.saturating_add(self.policy.interval);
                }
                RunState::Complete => {
                    self.log_transition(
                        test_id,
                        run_id,
                        &mut last_state,
                        PollState::Complete,
                        "run completed",
                    );
                    self.sleeper.sleep(self.policy.settle_delay).map_err(|_| PollError::Cancelled)?;
                    return Ok(PollReport {
                        status,
                        fetches,
                        elapsed,
                    });
                }
                RunState::Pending | RunState::Running | RunState::Unknown => {
                    let err = PollError::Api(ClientError::Malformed(
                        "unrecognized run state".to_string(),
                    ));
                    self.log_transition(
                        test_id,
                        run_id,
                        &mut last_state,
                        PollState::ApiError,
                        &err.to_string(),
                    );
                    return Err(err);
                }
            }
        }
    }

    /// Fetches one status snapshot, retrying transient failures when allowed.
    fn fetch_status(
        &self,
        test_id: &TestId,
        run_id: &RunId,
        key: &SecretKey,
        elapsed: &mut Duration,
        fetches: &mut u32,
    ) -> Result<RunStatus, PollError> {
        let retry = self.policy.retry;
        let mut attempt = 0_u32;
        let mut backoff = retry.initial_backoff;
        loop {
            *fetches = fetches.saturating_add(1);
            match self.client.run_status(test_id, run_id, key) {
                Ok(status) => return Ok(status),
                Err(err) if err.is_transient() && attempt < retry.max_retries => {
                    attempt += 1;
                    self.log.record(
                        GateEvent::new(
                            LogLevel::Warn,
                            GateStage::Poll,
                            "poll.retry",
                            format!(
                                "status fetch failed ({err}); retry {attempt}/{} in {}ms",
                                retry.max_retries,
                                backoff.as_millis()
                            ),
                        )
                        .with_test(test_id)
                        .with_run(run_id),
                    );
                    self.sleeper.sleep(backoff).map_err(|_| PollError::Cancelled)?;
                    *elapsed = elapsed.saturating_add(backoff);
                    backoff = backoff.saturating_mul(retry.multiplier);
                }
                Err(err) => return Err(PollError::Api(err)),
            }
        }
    }

    /// Logs a state change; repeated states are not logged again.
    fn log_transition(
        &self,
        test_id: &TestId,
        run_id: &RunId,
        last_state: &mut Option<PollState>,
        state: PollState,
        detail: &str,
    ) {
        if *last_state == Some(state) {
            return;
        }
        *last_state = Some(state);
        let level = match state {
            PollState::TimedOut | PollState::ApiError => LogLevel::Error,
            PollState::Pending | PollState::Running | PollState::Complete => LogLevel::Info,
        };
        self.log.record(
            GateEvent::new(
                level,
                GateStage::Poll,
                "poll.state",
                format!("poll state {}: {detail}", state.as_str()),
            )
            .with_test(test_id)
            .with_run(run_id),
        );
    }
}
