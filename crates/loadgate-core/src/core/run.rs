// crates/loadgate-core/src/core/run.rs
// ============================================================================
// Module: Load Gate Run Snapshots
// Description: Remote run status, poller states, and summary metrics.
// Purpose: Model read-only snapshots fetched from the remote test service.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! [`RunStatus`] and [`SummaryMetrics`] are snapshots re-fetched from the remote
//! service; the engine never mutates them. [`PollState`] is the completion
//! poller's own state machine, which extends the remote states with the
//! terminal `TimedOut` and `ApiError` outcomes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RunId;

// ============================================================================
// SECTION: Run State
// ============================================================================

/// Remote lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Run is queued and has not started generating load.
    Pending,
    /// Run is generating load.
    Running,
    /// Run finished.
    Complete,
    /// Remote reported a state this engine does not recognize.
    Unknown,
}

impl RunState {
    /// Maps a remote status label onto a run state (case-insensitive).
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "pending" | "queued" => Self::Pending,
            "running" | "in_progress" => Self::Running,
            "complete" | "completed" | "finished" => Self::Complete,
            _ => Self::Unknown,
        }
    }

    /// Returns true while the run is still in flight.
    #[must_use]
    pub const fn is_in_flight(self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }
}

/// Status snapshot of a run.
///
/// # Invariants
/// - `declared_duration_sec == 0` means the run has not reported a duration yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    /// Run identifier.
    pub run_id: RunId,
    /// Remote lifecycle state.
    pub state: RunState,
    /// Duration the run declared for itself, in seconds.
    pub declared_duration_sec: u64,
}

// ============================================================================
// SECTION: Poll State
// ============================================================================

/// State of the completion poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollState {
    /// Last fetch reported a pending run.
    Pending,
    /// Last fetch reported a running run.
    Running,
    /// Run completed (terminal).
    Complete,
    /// Run exceeded its declared duration plus the grace margin (terminal).
    TimedOut,
    /// Status fetch failed or returned a malformed payload (terminal).
    ApiError,
}

impl PollState {
    /// Returns a stable label for logging.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Complete => "complete",
            Self::TimedOut => "timed_out",
            Self::ApiError => "api_error",
        }
    }
}

impl From<RunState> for PollState {
    fn from(state: RunState) -> Self {
        match state {
            RunState::Pending => Self::Pending,
            RunState::Running => Self::Running,
            RunState::Complete => Self::Complete,
            RunState::Unknown => Self::ApiError,
        }
    }
}

// ============================================================================
// SECTION: Summary Metrics
// ============================================================================

/// Aggregate metrics computed by the remote service after completion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    /// Average response time in milliseconds.
    pub avg_response_time_ms: i64,
    /// Average error rate in percent.
    pub avg_error_rate_pct: f64,
}
