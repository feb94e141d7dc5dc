// crates/loadgate-core/src/core/mod.rs
// ============================================================================
// Module: Load Gate Core Types
// Description: Canonical Load Gate data model.
// Purpose: Provide stable, serializable types for credentials, runs, and verdicts.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Load Gate core types describe the inputs of a gate invocation (credentials,
//! thresholds, test identifiers), the snapshots fetched from the remote test
//! service (run status, summary metrics), and the verdict record attached to
//! the build. The engine never writes remote state; these values are read-only
//! snapshots.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod credentials;
pub mod identifiers;
pub mod run;
pub mod thresholds;
pub mod verdict;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use credentials::ApiKeyCredential;
pub use credentials::Credential;
pub use credentials::SecretKey;
pub use credentials::display_label;
pub use credentials::unique_credentials;
pub use identifiers::CredentialId;
pub use identifiers::RunId;
pub use identifiers::TestId;
pub use run::PollState;
pub use run::RunState;
pub use run::RunStatus;
pub use run::SummaryMetrics;
pub use thresholds::ThresholdConfig;
pub use thresholds::ThresholdError;
pub use verdict::AxisVerdicts;
pub use verdict::REPORT_NAME;
pub use verdict::RunReport;
pub use verdict::Verdict;
pub use verdict::VerdictRecord;
