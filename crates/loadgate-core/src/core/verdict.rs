// crates/loadgate-core/src/core/verdict.rs
// ============================================================================
// Module: Load Gate Verdicts
// Description: Build verdicts, per-axis verdicts, and the verdict record.
// Purpose: Provide the stable build-record surface produced per gate run.
// Dependencies: crate::core::{identifiers, run}, serde
// ============================================================================

//! ## Overview
//! A [`Verdict`] classifies the build. `Pass`, `Unstable`, and `Fail` come from
//! threshold evaluation; `NotBuilt` means the gate could not be evaluated at
//! all. The [`VerdictRecord`] is what hosts attach to the build, with the run
//! reference exposed under the fixed [`REPORT_NAME`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RunId;
use crate::core::identifiers::TestId;
use crate::core::run::SummaryMetrics;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Stable report-link name under which run references are exposed.
pub const REPORT_NAME: &str = "loadgate";

// ============================================================================
// SECTION: Verdict
// ============================================================================

/// Build gate classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Metrics are within thresholds.
    Pass,
    /// A warn threshold was exceeded.
    Unstable,
    /// A fail threshold was exceeded.
    Fail,
    /// The gate could not be evaluated.
    NotBuilt,
}

impl Verdict {
    /// Returns the severity rank among evaluated verdicts.
    ///
    /// `NotBuilt` is not an evaluation outcome and ranks alongside `Pass`.
    #[must_use]
    pub const fn severity(self) -> u8 {
        match self {
            Self::Pass | Self::NotBuilt => 0,
            Self::Unstable => 1,
            Self::Fail => 2,
        }
    }

    /// Returns the more severe of two evaluated verdicts.
    #[must_use]
    pub const fn worst(self, other: Self) -> Self {
        if other.severity() > self.severity() { other } else { self }
    }

    /// Returns the process exit code for this verdict.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Pass => 0,
            Self::Fail => 1,
            Self::Unstable => 2,
            Self::NotBuilt => 3,
        }
    }

    /// Returns a stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Unstable => "unstable",
            Self::Fail => "fail",
            Self::NotBuilt => "not_built",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdicts of the two independent evaluation axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisVerdicts {
    /// Verdict of the error-rate axis.
    pub error_rate: Verdict,
    /// Verdict of the latency axis.
    pub latency: Verdict,
}

impl AxisVerdicts {
    /// Returns the more severe of the two axis verdicts.
    #[must_use]
    pub const fn combined(self) -> Verdict {
        self.error_rate.worst(self.latency)
    }
}

// ============================================================================
// SECTION: Verdict Record
// ============================================================================

/// Reference to the remote run backing a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Stable report-link name ([`REPORT_NAME`]).
    pub report_name: String,
    /// Test identifier.
    pub test_id: TestId,
    /// Run identifier.
    pub run_id: RunId,
}

impl RunReport {
    /// Creates a report reference under [`REPORT_NAME`].
    #[must_use]
    pub fn new(test_id: TestId, run_id: RunId) -> Self {
        Self {
            report_name: REPORT_NAME.to_string(),
            test_id,
            run_id,
        }
    }
}

/// Record attached to the build for one gate invocation.
///
/// # Invariants
/// - `report` is present whenever the trigger succeeded.
/// - `metrics` is present only when the verdict came from threshold evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictRecord {
    /// Final verdict.
    pub verdict: Verdict,
    /// Run reference when a run was started.
    pub report: Option<RunReport>,
    /// Human-readable failure reason for `NotBuilt` outcomes.
    pub reason: Option<String>,
    /// Summary metrics the verdict was evaluated from.
    pub metrics: Option<SummaryMetrics>,
}
