// crates/loadgate-core/src/runtime/resolver.rs
// ============================================================================
// Module: Load Gate Credential Resolver
// Description: Deterministic credential lookup with a fallback chain.
// Purpose: Select the secret key presented to the remote service.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Resolution order:
//! 1. A non-empty configured identifier selects the first matching credential.
//! 2. Otherwise, a single available credential is used implicitly.
//! 3. Otherwise, the process-wide default identifier is looked up.
//!
//! A non-empty configured identifier that matches nothing does not fall
//! through to later steps. Resolution is a pure lookup over the supplied
//! credentials.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use thiserror::Error;

use crate::core::Credential;
use crate::core::CredentialId;
use crate::core::unique_credentials;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Credential resolution failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// No credential matched the requested identifier.
    #[error("no credential found for identifier '{requested}'")]
    NotFound {
        /// Identifier that was looked up (empty when none was configured).
        requested: String,
    },
    /// The matched credential carries an empty key.
    #[error("credential '{id}' has an empty api key")]
    BlankKey {
        /// Identifier of the matched credential.
        id: CredentialId,
    },
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Process-wide credential defaults injected into the resolver.
///
/// # Invariants
/// - Read-only during orchestration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct CredentialDefaults {
    /// Fallback credential identifier (may be empty).
    #[serde(default)]
    pub default_id: String,
}

/// Credential resolver bound to explicit defaults.
#[derive(Debug, Clone, Default)]
pub struct CredentialResolver {
    /// Injected defaults.
    defaults: CredentialDefaults,
}

impl CredentialResolver {
    /// Creates a resolver with the provided defaults.
    #[must_use]
    pub const fn new(defaults: CredentialDefaults) -> Self {
        Self {
            defaults,
        }
    }

    /// Returns the injected defaults.
    #[must_use]
    pub const fn defaults(&self) -> &CredentialDefaults {
        &self.defaults
    }

    /// Resolves a credential using the injected default identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] when no usable credential matches.
    pub fn resolve<'c, C: Credential>(
        &self,
        configured_id: &str,
        available: &'c [C],
    ) -> Result<&'c C, CredentialError> {
        resolve_credential(configured_id, &self.defaults.default_id, available)
    }
}

/// Resolves a credential from a configured id, a fallback id, and the
/// available credentials.
///
/// # Errors
///
/// Returns [`CredentialError::NotFound`] when nothing matches and
/// [`CredentialError::BlankKey`] when the match has an empty key.
pub fn resolve_credential<'c, C: Credential>(
    configured_id: &str,
    fallback_id: &str,
    available: &'c [C],
) -> Result<&'c C, CredentialError> {
    let configured = configured_id.trim();
    let (requested, found) = if configured.is_empty() {
        match unique_credentials(available).as_slice() {
            [only] => (String::new(), Some(*only)),
            _ => {
                let fallback = fallback_id.trim();
                let found = if fallback.is_empty() { None } else { find(fallback, available) };
                (fallback.to_string(), found)
            }
        }
    } else {
        (configured.to_string(), find(configured, available))
    };
    let credential = found.ok_or(CredentialError::NotFound {
        requested,
    })?;
    if credential.secret_key().is_blank() {
        return Err(CredentialError::BlankKey {
            id: credential.identifier(),
        });
    }
    Ok(credential)
}

/// Returns the first credential whose identifier equals `id`.
fn find<'c, C: Credential>(id: &str, available: &'c [C]) -> Option<&'c C> {
    available.iter().find(|credential| credential.identifier().as_str() == id)
}
