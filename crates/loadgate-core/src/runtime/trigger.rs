// crates/loadgate-core/src/runtime/trigger.rs
// ============================================================================
// Module: Load Gate Test Trigger
// Description: Starts a remote test run and obtains its run identifier.
// Purpose: Detect unknown tests or keys at trigger time.
// Dependencies: crate::{core, interfaces}, thiserror
// ============================================================================

//! ## Overview
//! The trigger issues exactly one start call per gate invocation and never
//! retries. Any failure is terminal for the build.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::Credential;
use crate::core::RunId;
use crate::core::TestId;
use crate::interfaces::ClientError;
use crate::interfaces::MetricsClient;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Trigger failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriggerError {
    /// Remote did not recognize the test identifier or API key.
    #[error("invalid test: {0}")]
    InvalidTest(String),
    /// Start request failed for another reason.
    #[error("failed to start test: {0}")]
    Api(ClientError),
}

// ============================================================================
// SECTION: Trigger
// ============================================================================

/// Starts named test runs through a metrics client.
pub struct TestTrigger<'a, M: MetricsClient + ?Sized> {
    /// Client used for the start call.
    client: &'a M,
}

impl<'a, M: MetricsClient + ?Sized> TestTrigger<'a, M> {
    /// Creates a trigger over the provided client.
    #[must_use]
    pub const fn new(client: &'a M) -> Self {
        Self {
            client,
        }
    }

    /// Starts a run of `test_id` with the credential's key.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::InvalidTest`] when the test id is blank, the
    /// remote rejects it, or no run id comes back.
    pub fn start<C: Credential + ?Sized>(
        &self,
        test_id: &TestId,
        credential: &C,
    ) -> Result<RunId, TriggerError> {
        if test_id.is_blank() {
            return Err(TriggerError::InvalidTest("test id is empty".to_string()));
        }
        match self.client.start_run(test_id, credential.secret_key()) {
            Ok(run_id) if run_id.as_str().trim().is_empty() => {
                Err(TriggerError::InvalidTest("remote returned an empty run id".to_string()))
            }
            Ok(run_id) => Ok(run_id),
            Err(ClientError::Rejected(reason)) => Err(TriggerError::InvalidTest(reason)),
            Err(err) => Err(TriggerError::Api(err)),
        }
    }
}
