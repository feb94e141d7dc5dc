// crates/loadgate-core/src/lib.rs
// ============================================================================
// Module: Load Gate Core Library
// Description: Public API surface for the Load Gate core.
// Purpose: Expose data model, collaborator interfaces, and the gate runtime.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Load Gate core drives a remote load test to completion and classifies the
//! build from its summary metrics. It is transport-agnostic: the remote test
//! service, the log pipeline, and the build record are reached through the
//! interfaces in [`interfaces`], so hosts supply their own implementations.
//!
//! Invariants:
//! - A `Fail` or `Unstable` verdict is only produced after summary metrics
//!   were fetched; every earlier failure yields `NotBuilt`.
//! - The runner always completes and always returns a verdict.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::ClientError;
pub use interfaces::GateEvent;
pub use interfaces::GateLog;
pub use interfaces::GateStage;
pub use interfaces::Interrupted;
pub use interfaces::LogLevel;
pub use interfaces::MetricsClient;
pub use interfaces::RecordError;
pub use interfaces::Sleeper;
pub use interfaces::VerdictRecorder;
pub use runtime::CancellationToken;
pub use runtime::CompletionPoller;
pub use runtime::CredentialDefaults;
pub use runtime::CredentialError;
pub use runtime::CredentialResolver;
pub use runtime::GateError;
pub use runtime::GateOutcome;
pub use runtime::GateRequest;
pub use runtime::GateRunner;
pub use runtime::InMemoryGateLog;
pub use runtime::InMemoryVerdictRecorder;
pub use runtime::JsonLinesGateLog;
pub use runtime::JsonLinesVerdictRecorder;
pub use runtime::NoopGateLog;
pub use runtime::PollError;
pub use runtime::PollPolicy;
pub use runtime::PollReport;
pub use runtime::RetryPolicy;
pub use runtime::TestTrigger;
pub use runtime::ThreadSleeper;
pub use runtime::TriggerError;
pub use runtime::evaluate;
pub use runtime::evaluate_axes;
