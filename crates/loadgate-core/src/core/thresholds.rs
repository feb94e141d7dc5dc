// crates/loadgate-core/src/core/thresholds.rs
// ============================================================================
// Module: Load Gate Thresholds
// Description: Operator-configured thresholds mapping metrics to verdicts.
// Purpose: Validate threshold ranges before any remote call is made.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Thresholds bound the average error rate (percent) and the average response
//! time (milliseconds). A value above the `fail` bound fails the build, a
//! value above the `warn` bound marks it unstable.
//! Invariants:
//! - Percentages must lie in `[0, 100]`; latencies must be `>= 0`.
//! - Invalid thresholds are detected before the remote service is contacted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Upper bound for percentage thresholds.
const MAX_PERCENTAGE: i64 = 100;

// ============================================================================
// SECTION: Threshold Configuration
// ============================================================================

/// Thresholds applied to summary metrics.
///
/// # Invariants
/// - Validated via [`ThresholdConfig::validate`] before orchestration starts.
/// - Omitted fields default to 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdConfig {
    /// Error rate percentage above which the build fails.
    pub error_rate_fail: i64,
    /// Error rate percentage above which the build is unstable.
    pub error_rate_warn: i64,
    /// Average response time (ms) above which the build fails.
    pub latency_fail_ms: i64,
    /// Average response time (ms) above which the build is unstable.
    pub latency_warn_ms: i64,
}

impl ThresholdConfig {
    /// Validates threshold ranges.
    ///
    /// # Errors
    ///
    /// Returns the first [`ThresholdError`] found, checking error-rate bounds
    /// before latency bounds.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        match self.issues().into_iter().next() {
            Some(issue) => Err(issue),
            None => Ok(()),
        }
    }

    /// Returns every range violation in evaluation order.
    #[must_use]
    pub fn issues(&self) -> Vec<ThresholdError> {
        let mut issues = Vec::new();
        for (field, value) in
            [("error_rate_warn", self.error_rate_warn), ("error_rate_fail", self.error_rate_fail)]
        {
            if !(0 ..= MAX_PERCENTAGE).contains(&value) {
                issues.push(ThresholdError::PercentageOutOfRange {
                    field,
                    value,
                });
            }
        }
        for (field, value) in
            [("latency_warn_ms", self.latency_warn_ms), ("latency_fail_ms", self.latency_fail_ms)]
        {
            if value < 0 {
                issues.push(ThresholdError::NegativeLatency {
                    field,
                    value,
                });
            }
        }
        issues
    }

    /// Returns human-readable descriptions of the effective rules.
    #[must_use]
    pub fn describe_rules(&self) -> Vec<String> {
        vec![
            format!("error rate above {}% will be considered unstable", self.error_rate_warn),
            format!("error rate above {}% will be considered failed", self.error_rate_fail),
            format!("response time above {}ms will be considered unstable", self.latency_warn_ms),
            format!("response time above {}ms will be considered failed", self.latency_fail_ms),
        ]
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Threshold range violations.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThresholdError {
    /// A percentage threshold lies outside `[0, 100]`.
    #[error("{field} must be between 0 and 100 (got {value})")]
    PercentageOutOfRange {
        /// Offending field name.
        field: &'static str,
        /// Offending value.
        value: i64,
    },
    /// A latency threshold is negative.
    #[error("{field} must be greater than or equal to 0 (got {value})")]
    NegativeLatency {
        /// Offending field name.
        field: &'static str,
        /// Offending value.
        value: i64,
    },
}
