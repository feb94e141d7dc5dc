// crates/loadgate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Load Gate Interfaces
// Description: Collaborator interfaces for the remote service, logs, and records.
// Purpose: Define the contract surfaces used by the Load Gate runtime.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how Load Gate reaches external systems without embedding
//! transport details. The runtime is single-threaded and blocking, so these
//! traits are synchronous; implementations must fail closed on missing or
//! malformed data.
//!
//! Security posture: remote payloads are untrusted, and secrets passed to
//! [`MetricsClient`] must never be logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::core::RunId;
use crate::core::RunStatus;
use crate::core::SecretKey;
use crate::core::SummaryMetrics;
use crate::core::TestId;
use crate::core::VerdictRecord;

// ============================================================================
// SECTION: Metrics Client
// ============================================================================

/// Errors reported by a metrics client.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Request could not be sent or the response could not be read.
    #[error("transport error: {0}")]
    Transport(String),
    /// Remote returned an unexpected HTTP status.
    #[error("unexpected http status {status}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
    },
    /// Remote rejected the test identifier or API key.
    #[error("rejected by remote service: {0}")]
    Rejected(String),
    /// Remote returned a payload that could not be interpreted.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ClientError {
    /// Returns true when retrying the same request may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::HttpStatus {
                status,
            } => *status >= 500,
            Self::Rejected(_) | Self::Malformed(_) => false,
        }
    }
}

/// Typed request/response access to the remote test service.
///
/// Implementations perform no retries of their own.
pub trait MetricsClient {
    /// Starts a run of the given test and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Rejected`] when the test or key is unrecognized.
    fn start_run(&self, test_id: &TestId, key: &SecretKey) -> Result<RunId, ClientError>;

    /// Fetches the current status of a run.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the fetch fails or the payload is malformed.
    fn run_status(
        &self,
        test_id: &TestId,
        run_id: &RunId,
        key: &SecretKey,
    ) -> Result<RunStatus, ClientError>;

    /// Fetches the summary metrics of a completed run.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the fetch fails or the payload is malformed.
    fn summary(
        &self,
        test_id: &TestId,
        run_id: &RunId,
        key: &SecretKey,
    ) -> Result<SummaryMetrics, ClientError>;

    /// Lists available test definitions as `test id -> display name`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Rejected`] when the key is invalid.
    fn list_tests(&self, key: &SecretKey) -> Result<BTreeMap<TestId, String>, ClientError>;
}

// ============================================================================
// SECTION: Gate Log
// ============================================================================

/// Severity of a gate log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Progress information.
    Info,
    /// Recoverable anomaly.
    Warn,
    /// Stage failure.
    Error,
}

/// Orchestration stage an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStage {
    /// Threshold validation.
    Config,
    /// Credential resolution.
    Credential,
    /// Test trigger.
    Trigger,
    /// Completion polling.
    Poll,
    /// Summary metrics retrieval.
    Summary,
    /// Threshold evaluation.
    Evaluate,
    /// Verdict recording.
    Record,
}

/// Structured gate log event.
///
/// # Invariants
/// - `message` is human-readable and never contains secret keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateEvent {
    /// Stable event identifier.
    pub event: &'static str,
    /// Event severity.
    pub level: LogLevel,
    /// Orchestration stage.
    pub stage: GateStage,
    /// Human-readable message.
    pub message: String,
    /// Test identifier when known.
    pub test_id: Option<TestId>,
    /// Run identifier when known.
    pub run_id: Option<RunId>,
}

impl GateEvent {
    /// Creates an event without run references.
    #[must_use]
    pub fn new(
        level: LogLevel,
        stage: GateStage,
        event: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            event,
            level,
            stage,
            message: message.into(),
            test_id: None,
            run_id: None,
        }
    }

    /// Attaches a test identifier.
    #[must_use]
    pub fn with_test(mut self, test_id: &TestId) -> Self {
        self.test_id = Some(test_id.clone());
        self
    }

    /// Attaches a run identifier.
    #[must_use]
    pub fn with_run(mut self, run_id: &RunId) -> Self {
        self.run_id = Some(run_id.clone());
        self
    }
}

/// Sink for structured gate log events.
pub trait GateLog {
    /// Records a log event. Sinks must not fail the orchestration.
    fn record(&self, event: GateEvent);
}

// ============================================================================
// SECTION: Verdict Recorder
// ============================================================================

/// Errors emitted by verdict recorders.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Recorder failed to persist the record.
    #[error("verdict record write failed: {0}")]
    WriteFailed(String),
}

/// Attaches verdict records to the host build record.
pub trait VerdictRecorder {
    /// Records the verdict of one gate invocation.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] when the record cannot be persisted.
    fn record(&self, record: &VerdictRecord) -> Result<(), RecordError>;
}

// ============================================================================
// SECTION: Sleeper
// ============================================================================

/// Returned when a sleep was interrupted by cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("wait interrupted by cancellation")]
pub struct Interrupted;

/// Blocking, cancelable wait used between status fetches.
pub trait Sleeper {
    /// Blocks for `duration` unless cancelled first.
    ///
    /// # Errors
    ///
    /// Returns [`Interrupted`] when cancellation is requested before or
    /// during the wait.
    fn sleep(&self, duration: Duration) -> Result<(), Interrupted>;

    /// Returns true when cancellation has been requested.
    fn is_cancelled(&self) -> bool;
}
