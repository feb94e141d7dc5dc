// crates/loadgate-core/src/runtime/mod.rs
// ============================================================================
// Module: Load Gate Runtime
// Description: Orchestration engine for remote load-test gates.
// Purpose: Resolve credentials, drive runs to completion, and classify builds.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The runtime is single-threaded and blocking per gate invocation. Each
//! stage is usable on its own ([`CredentialResolver`], [`TestTrigger`],
//! [`CompletionPoller`], [`evaluate`]) and [`GateRunner`] chains them into the
//! full gate.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cancel;
pub mod evaluator;
pub mod gate;
pub mod poller;
pub mod resolver;
pub mod sinks;
pub mod trigger;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cancel::CancellationToken;
pub use cancel::ThreadSleeper;
pub use evaluator::EPSILON;
pub use evaluator::evaluate;
pub use evaluator::evaluate_axes;
pub use gate::GateError;
pub use gate::GateOutcome;
pub use gate::GateRequest;
pub use gate::GateRunner;
pub use poller::CompletionPoller;
pub use poller::PollError;
pub use poller::PollPolicy;
pub use poller::PollReport;
pub use poller::RetryPolicy;
pub use resolver::CredentialDefaults;
pub use resolver::CredentialError;
pub use resolver::CredentialResolver;
pub use resolver::resolve_credential;
pub use sinks::InMemoryGateLog;
pub use sinks::InMemoryVerdictRecorder;
pub use sinks::JsonLinesGateLog;
pub use sinks::JsonLinesVerdictRecorder;
pub use sinks::NoopGateLog;
pub use trigger::TestTrigger;
pub use trigger::TriggerError;
