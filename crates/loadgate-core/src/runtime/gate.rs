// crates/loadgate-core/src/runtime/gate.rs
// ============================================================================
// Module: Load Gate Runner
// Description: End-to-end orchestration of one gate invocation.
// Purpose: Resolve, trigger, poll, fetch, evaluate, and record a verdict.
// Dependencies: crate::{core, interfaces, runtime}, thiserror
// ============================================================================

//! ## Overview
//! [`GateRunner::run`] executes the stages in order: threshold validation,
//! credential resolution, test trigger, completion polling, summary fetch, and
//! threshold evaluation. Every stage failure is logged with a readable reason
//! and downgraded to `NotBuilt`; nothing propagates to the host as a fault.
//! The verdict record is always handed to the recorder, and it carries the run
//! reference whenever the trigger succeeded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::AxisVerdicts;
use crate::core::Credential;
use crate::core::RunReport;
use crate::core::SummaryMetrics;
use crate::core::TestId;
use crate::core::ThresholdConfig;
use crate::core::ThresholdError;
use crate::core::Verdict;
use crate::core::VerdictRecord;
use crate::interfaces::ClientError;
use crate::interfaces::GateEvent;
use crate::interfaces::GateLog;
use crate::interfaces::GateStage;
use crate::interfaces::LogLevel;
use crate::interfaces::MetricsClient;
use crate::interfaces::Sleeper;
use crate::interfaces::VerdictRecorder;
use crate::runtime::evaluator::evaluate_axes;
use crate::runtime::poller::CompletionPoller;
use crate::runtime::poller::PollError;
use crate::runtime::poller::PollPolicy;
use crate::runtime::resolver::CredentialError;
use crate::runtime::resolver::CredentialResolver;
use crate::runtime::trigger::TestTrigger;
use crate::runtime::trigger::TriggerError;

// ============================================================================
// SECTION: Requests and Outcomes
// ============================================================================

/// Inputs of one gate invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateRequest {
    /// Configured credential identifier (may be empty).
    pub api_key_id: String,
    /// Test to run.
    pub test_id: TestId,
    /// Thresholds applied to the summary metrics.
    pub thresholds: ThresholdConfig,
}

/// Reasons a gate could not be evaluated.
///
/// # Invariants
/// - Every variant maps to [`Verdict::NotBuilt`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// Thresholds are out of range.
    #[error("invalid thresholds: {0}")]
    Config(ThresholdError),
    /// No usable credential.
    #[error("credential resolution failed: {0}")]
    Credential(CredentialError),
    /// Run could not be started.
    #[error("{0}")]
    Trigger(TriggerError),
    /// Run did not complete cleanly.
    #[error("{0}")]
    Poll(PollError),
    /// Summary metrics could not be fetched.
    #[error("summary metrics unavailable: {0}")]
    Summary(ClientError),
    /// Build was aborted.
    #[error("gate cancelled")]
    Cancelled,
}

impl GateError {
    /// Returns the verdict for this failure (always `NotBuilt`).
    #[must_use]
    pub const fn verdict(&self) -> Verdict {
        Verdict::NotBuilt
    }

    /// Returns the stage the failure belongs to.
    #[must_use]
    pub const fn stage(&self) -> GateStage {
        match self {
            Self::Config(_) => GateStage::Config,
            Self::Credential(_) => GateStage::Credential,
            Self::Trigger(_) => GateStage::Trigger,
            Self::Poll(_) | Self::Cancelled => GateStage::Poll,
            Self::Summary(_) => GateStage::Summary,
        }
    }
}

impl From<PollError> for GateError {
    fn from(err: PollError) -> Self {
        match err {
            PollError::Cancelled => Self::Cancelled,
            other => Self::Poll(other),
        }
    }
}

/// Result of one gate invocation.
///
/// # Invariants
/// - `verdict` is `NotBuilt` exactly when `error` is set.
/// - `metrics` and `axes` are set only when evaluation ran.
#[derive(Debug, Clone, PartialEq)]
pub struct GateOutcome {
    /// Final verdict.
    pub verdict: Verdict,
    /// Run reference when the trigger succeeded.
    pub report: Option<RunReport>,
    /// Summary metrics the verdict was evaluated from.
    pub metrics: Option<SummaryMetrics>,
    /// Per-axis verdicts.
    pub axes: Option<AxisVerdicts>,
    /// Failure that forced `NotBuilt`.
    pub error: Option<GateError>,
}

impl GateOutcome {
    /// Builds a `NotBuilt` outcome.
    fn not_built(error: GateError, report: Option<RunReport>) -> Self {
        Self {
            verdict: error.verdict(),
            report,
            metrics: None,
            axes: None,
            error: Some(error),
        }
    }

    /// Builds the record attached to the build.
    #[must_use]
    pub fn to_record(&self) -> VerdictRecord {
        VerdictRecord {
            verdict: self.verdict,
            report: self.report.clone(),
            reason: self.error.as_ref().map(ToString::to_string),
            metrics: self.metrics,
        }
    }
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Orchestrates one gate invocation at a time.
pub struct GateRunner<'a, M: MetricsClient + ?Sized, S: Sleeper + ?Sized> {
    /// Remote test service client.
    client: &'a M,
    /// Sleeper for polling waits.
    sleeper: &'a S,
    /// Credential resolver with injected defaults.
    resolver: CredentialResolver,
    /// Poller timing policy.
    policy: PollPolicy,
}

impl<'a, M: MetricsClient + ?Sized, S: Sleeper + ?Sized> GateRunner<'a, M, S> {
    /// Creates a runner.
    #[must_use]
    pub const fn new(
        client: &'a M,
        sleeper: &'a S,
        resolver: CredentialResolver,
        policy: PollPolicy,
    ) -> Self {
        Self {
            client,
            sleeper,
            resolver,
            policy,
        }
    }

    /// Runs the gate, records the verdict, and returns the outcome.
    pub fn run<C: Credential>(
        &self,
        request: &GateRequest,
        credentials: &[C],
        log: &dyn GateLog,
        recorder: &dyn VerdictRecorder,
    ) -> GateOutcome {
        let outcome = self.execute(request, credentials, log);
        let (level, message) = match &outcome.error {
            Some(err) => (LogLevel::Error, format!("verdict not_built: {err}")),
            None => (LogLevel::Info, format!("verdict {}", outcome.verdict)),
        };
        let mut event = GateEvent::new(level, GateStage::Record, "gate.verdict", message)
            .with_test(&request.test_id);
        if let Some(report) = &outcome.report {
            event = event.with_run(&report.run_id);
        }
        log.record(event);
        if let Err(err) = recorder.record(&outcome.to_record()) {
            log.record(
                GateEvent::new(LogLevel::Error, GateStage::Record, "record.failed", err.to_string())
                    .with_test(&request.test_id),
            );
        }
        outcome
    }

    /// Executes the stages and converts any failure into `NotBuilt`.
    fn execute<C: Credential>(
        &self,
        request: &GateRequest,
        credentials: &[C],
        log: &dyn GateLog,
    ) -> GateOutcome {
        let test_id = &request.test_id;
        for rule in request.thresholds.describe_rules() {
            log.record(GateEvent::new(LogLevel::Info, GateStage::Config, "config.rule", rule));
        }
        if let Err(err) = request.thresholds.validate() {
            return fail(log, test_id, GateError::Config(err), None);
        }
        if self.sleeper.is_cancelled() {
            return fail(log, test_id, GateError::Cancelled, None);
        }

        let credential = match self.resolver.resolve(&request.api_key_id, credentials) {
            Ok(credential) => credential,
            Err(err) => return fail(log, test_id, GateError::Credential(err), None),
        };
        log.record(
            GateEvent::new(
                LogLevel::Info,
                GateStage::Credential,
                "credential.resolved",
                format!("using credential {}", credential.identifier()),
            )
            .with_test(test_id),
        );

        let run_id = match TestTrigger::new(self.client).start(test_id, credential) {
            Ok(run_id) => run_id,
            Err(err) => return fail(log, test_id, GateError::Trigger(err), None),
        };
        let report = RunReport::new(test_id.clone(), run_id.clone());
        log.record(
            GateEvent::new(LogLevel::Info, GateStage::Trigger, "trigger.started", "test run started")
                .with_test(test_id)
                .with_run(&run_id),
        );

        let poller = CompletionPoller::new(self.client, self.sleeper, self.policy, log);
        let poll = match poller.wait_for_completion(test_id, &run_id, credential.secret_key()) {
            Ok(poll) => poll,
            Err(err) => return fail(log, test_id, GateError::from(err), Some(report)),
        };
        if self.sleeper.is_cancelled() {
            return fail(log, test_id, GateError::Cancelled, Some(report));
        }

        let metrics = match self.client.summary(test_id, &run_id, credential.secret_key()) {
            Ok(metrics) => metrics,
            Err(err) => return fail(log, test_id, GateError::Summary(err), Some(report)),
        };
        log.record(
            GateEvent::new(
                LogLevel::Info,
                GateStage::Summary,
                "summary.fetched",
                format!(
                    "avg response time {}ms, avg error rate {}% after {} status fetches",
                    metrics.avg_response_time_ms, metrics.avg_error_rate_pct, poll.fetches
                ),
            )
            .with_test(test_id)
            .with_run(&run_id),
        );

        let axes = evaluate_axes(&metrics, &request.thresholds);
        log.record(
            GateEvent::new(
                LogLevel::Info,
                GateStage::Evaluate,
                "evaluate.axes",
                format!("error rate axis {}, latency axis {}", axes.error_rate, axes.latency),
            )
            .with_test(test_id)
            .with_run(&run_id),
        );
        GateOutcome {
            verdict: axes.combined(),
            report: Some(report),
            metrics: Some(metrics),
            axes: Some(axes),
            error: None,
        }
    }
}

/// Logs a stage failure and builds the `NotBuilt` outcome.
fn fail(
    log: &dyn GateLog,
    test_id: &TestId,
    error: GateError,
    report: Option<RunReport>,
) -> GateOutcome {
    let mut event = GateEvent::new(LogLevel::Error, error.stage(), "stage.failed", error.to_string())
        .with_test(test_id);
    if let Some(report) = &report {
        event = event.with_run(&report.run_id);
    }
    log.record(event);
    GateOutcome::not_built(error, report)
}
