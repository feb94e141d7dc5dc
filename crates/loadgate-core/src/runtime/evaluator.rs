// crates/loadgate-core/src/runtime/evaluator.rs
// ============================================================================
// Module: Load Gate Threshold Evaluator
// Description: Pure mapping from summary metrics and thresholds to a verdict.
// Purpose: Classify build quality with a small floating-point tolerance.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Each axis (error rate, then latency) is evaluated independently: the fail
//! bound is checked before the warn bound and the first match wins. The final
//! verdict is the more severe of the two axis verdicts.
//!
//! A metric exceeds a threshold only when `metric - threshold > EPSILON`. A
//! negative threshold disables its check.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::AxisVerdicts;
use crate::core::SummaryMetrics;
use crate::core::ThresholdConfig;
use crate::core::Verdict;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Tolerance absorbing floating-point noise in threshold comparisons.
pub const EPSILON: f64 = 0.000_05;

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluates metrics against thresholds and returns the combined verdict.
#[must_use]
pub fn evaluate(metrics: &SummaryMetrics, thresholds: &ThresholdConfig) -> Verdict {
    evaluate_axes(metrics, thresholds).combined()
}

/// Evaluates both axes and returns their verdicts separately.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    reason = "Latency milliseconds are far below the f64 exact-integer range."
)]
pub fn evaluate_axes(metrics: &SummaryMetrics, thresholds: &ThresholdConfig) -> AxisVerdicts {
    AxisVerdicts {
        error_rate: axis_verdict(
            metrics.avg_error_rate_pct,
            thresholds.error_rate_fail,
            thresholds.error_rate_warn,
        ),
        latency: axis_verdict(
            metrics.avg_response_time_ms as f64,
            thresholds.latency_fail_ms,
            thresholds.latency_warn_ms,
        ),
    }
}

/// Evaluates one axis, checking the fail bound first.
fn axis_verdict(metric: f64, fail: i64, warn: i64) -> Verdict {
    if exceeds(metric, fail) {
        Verdict::Fail
    } else if exceeds(metric, warn) {
        Verdict::Unstable
    } else {
        Verdict::Pass
    }
}

/// Returns true when an enabled threshold is exceeded beyond [`EPSILON`].
#[allow(
    clippy::cast_precision_loss,
    reason = "Configured thresholds are small integers."
)]
fn exceeds(metric: f64, threshold: i64) -> bool {
    threshold >= 0 && metric - threshold as f64 > EPSILON
}
