// crates/loadgate-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Scripted metrics client and simulated sleeper for core tests.
// Purpose: Drive the gate runtime deterministically without network or wall clock.
// Dependencies: loadgate-core
// ============================================================================

//! ## Overview
//! [`ScriptedClient`] replays a fixed sequence of status responses and records
//! every remote call. [`SimulatedSleeper`] advances a virtual clock instead of
//! blocking and can cancel itself after a number of waits.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::unwrap_in_result,
    reason = "Test fixtures favor direct unwraps for setup clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use loadgate_core::ApiKeyCredential;
use loadgate_core::ClientError;
use loadgate_core::Interrupted;
use loadgate_core::MetricsClient;
use loadgate_core::RunId;
use loadgate_core::RunState;
use loadgate_core::RunStatus;
use loadgate_core::SecretKey;
use loadgate_core::Sleeper;
use loadgate_core::SummaryMetrics;
use loadgate_core::TestId;
use loadgate_core::ThresholdConfig;

// ============================================================================
// SECTION: Scripted Client
// ============================================================================

/// Remote call observed by the scripted client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Start(String),
    Status(String),
    Summary(String),
    List,
}

/// Metrics client replaying scripted responses.
pub struct ScriptedClient {
    start: Result<RunId, ClientError>,
    statuses: Mutex<VecDeque<Result<RunStatus, ClientError>>>,
    /// Returned once the scripted statuses are exhausted.
    repeat: Result<RunStatus, ClientError>,
    summary: Result<SummaryMetrics, ClientError>,
    calls: Mutex<Vec<Call>>,
    keys: Mutex<Vec<String>>,
}

impl ScriptedClient {
    /// Creates a client whose run stays in `repeat_state` after the script.
    pub fn new(repeat_state: RunState, declared_duration_sec: u64) -> Self {
        Self {
            start: Ok(RunId::new("run-1")),
            statuses: Mutex::new(VecDeque::new()),
            repeat: Ok(status(repeat_state, declared_duration_sec)),
            summary: Ok(metrics(100, 0.0)),
            calls: Mutex::new(Vec::new()),
            keys: Mutex::new(Vec::new()),
        }
    }

    /// Creates a client reporting the given states in order, then `Complete`.
    pub fn with_states(states: &[RunState], declared_duration_sec: u64) -> Self {
        let client = Self::new(RunState::Complete, declared_duration_sec);
        for state in states {
            client.push_status(Ok(status(*state, declared_duration_sec)));
        }
        client
    }

    pub fn push_status(&self, response: Result<RunStatus, ClientError>) {
        self.statuses.lock().unwrap().push_back(response);
    }

    pub fn with_start(mut self, start: Result<RunId, ClientError>) -> Self {
        self.start = start;
        self
    }

    pub fn with_repeat(mut self, repeat: Result<RunStatus, ClientError>) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_summary(mut self, summary: Result<SummaryMetrics, ClientError>) -> Self {
        self.summary = summary;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> usize {
        self.calls().iter().filter(|call| matches!(call, Call::Status(_))).count()
    }

    pub fn keys_used(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }

    fn note(&self, call: Call, key: &SecretKey) {
        self.calls.lock().unwrap().push(call);
        self.keys.lock().unwrap().push(key.expose().to_string());
    }
}

impl MetricsClient for ScriptedClient {
    fn start_run(&self, test_id: &TestId, key: &SecretKey) -> Result<RunId, ClientError> {
        self.note(Call::Start(test_id.to_string()), key);
        self.start.clone()
    }

    fn run_status(
        &self,
        _test_id: &TestId,
        run_id: &RunId,
        key: &SecretKey,
    ) -> Result<RunStatus, ClientError> {
        self.note(Call::Status(run_id.to_string()), key);
        self.statuses.lock().unwrap().pop_front().unwrap_or_else(|| self.repeat.clone())
    }

    fn summary(
        &self,
        _test_id: &TestId,
        run_id: &RunId,
        key: &SecretKey,
    ) -> Result<SummaryMetrics, ClientError> {
        self.note(Call::Summary(run_id.to_string()), key);
        self.summary.clone()
    }

    fn list_tests(&self, key: &SecretKey) -> Result<BTreeMap<TestId, String>, ClientError> {
        self.note(Call::List, key);
        Ok(BTreeMap::new())
    }
}

// ============================================================================
// SECTION: Simulated Sleeper
// ============================================================================

/// Sleeper advancing a virtual clock.
#[derive(Default)]
pub struct SimulatedSleeper {
    waits: Mutex<Vec<Duration>>,
    cancel_after: Option<usize>,
    cancelled: Mutex<bool>,
}

impl SimulatedSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels during the wait with the given zero-based index.
    pub fn cancelling_at(index: usize) -> Self {
        Self {
            cancel_after: Some(index),
            ..Self::default()
        }
    }

    /// Creates a sleeper that is already cancelled.
    pub fn cancelled() -> Self {
        let sleeper = Self::default();
        *sleeper.cancelled.lock().unwrap() = true;
        sleeper
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }

    pub fn total(&self) -> Duration {
        self.waits().iter().sum()
    }
}

impl Sleeper for SimulatedSleeper {
    fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        if *self.cancelled.lock().unwrap() {
            return Err(Interrupted);
        }
        let mut waits = self.waits.lock().unwrap();
        if self.cancel_after == Some(waits.len()) {
            *self.cancelled.lock().unwrap() = true;
            return Err(Interrupted);
        }
        waits.push(duration);
        Ok(())
    }

    fn is_cancelled(&self) -> bool {
        *self.cancelled.lock().unwrap()
    }
}

// ============================================================================
// SECTION: Builders
// ============================================================================

pub fn status(state: RunState, declared_duration_sec: u64) -> RunStatus {
    RunStatus {
        run_id: RunId::new("run-1"),
        state,
        declared_duration_sec,
    }
}

pub fn metrics(avg_response_time_ms: i64, avg_error_rate_pct: f64) -> SummaryMetrics {
    SummaryMetrics {
        avg_response_time_ms,
        avg_error_rate_pct,
    }
}

pub const fn thresholds(
    error_rate_fail: i64,
    error_rate_warn: i64,
    latency_fail_ms: i64,
    latency_warn_ms: i64,
) -> ThresholdConfig {
    ThresholdConfig {
        error_rate_fail,
        error_rate_warn,
        latency_fail_ms,
        latency_warn_ms,
    }
}

pub fn credential(key: &str) -> ApiKeyCredential {
    ApiKeyCredential::new(key, format!("key {key}"))
}
