// crates/loadgate-core/src/core/credentials.rs
// ============================================================================
// Module: Load Gate Credentials
// Description: Credential capability and the API-key credential provider.
// Purpose: Present secrets to the remote service without leaking them in logs.
// Dependencies: crate::core::identifiers
// ============================================================================

//! ## Overview
//! A credential exposes a redacted identifier, the secret key, and an operator
//! description. The identifier is derived from the key itself, so two
//! credentials holding the same key collapse to one identifier. Concrete
//! providers are selected by the host credential store, never by the core.
//!
//! Security posture: secret keys must never reach logs or records; only the
//! redacted identifier may be surfaced.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::core::identifiers::CredentialId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of leading key characters kept in a credential identifier.
const ID_PREFIX_CHARS: usize = 4;
/// Number of trailing key characters kept in a credential identifier.
const ID_SUFFIX_CHARS: usize = 6;

// ============================================================================
// SECTION: Secret Key
// ============================================================================

/// Plain-text API key presented to the remote service.
///
/// # Invariants
/// - `Debug` and `Display` print the redacted identifier, never the key.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);

impl SecretKey {
    /// Wraps a plain-text key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the plain-text key. Callers must not log the result.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true when the key is empty or whitespace only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Derives the redacted identifier for this key.
    #[must_use]
    pub fn redacted_id(&self) -> CredentialId {
        let chars: Vec<char> = self.0.chars().collect();
        let head: String = chars.iter().take(ID_PREFIX_CHARS).collect();
        let tail: String = chars[chars.len().saturating_sub(ID_SUFFIX_CHARS) ..].iter().collect();
        CredentialId::new(format!("{head}...{tail}"))
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecretKey").field(&self.redacted_id().as_str()).finish()
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.redacted_id().fmt(f)
    }
}

// ============================================================================
// SECTION: Credential Capability
// ============================================================================

/// Capability set shared by every credential provider.
pub trait Credential {
    /// Returns the redacted identifier used for lookups.
    fn identifier(&self) -> CredentialId;

    /// Returns the secret key presented to the remote service.
    fn secret_key(&self) -> &SecretKey;

    /// Returns the operator-facing description (may be empty).
    fn description(&self) -> &str;
}

impl<T: Credential + ?Sized> Credential for &T {
    fn identifier(&self) -> CredentialId {
        (**self).identifier()
    }

    fn secret_key(&self) -> &SecretKey {
        (**self).secret_key()
    }

    fn description(&self) -> &str {
        (**self).description()
    }
}

impl<T: Credential + ?Sized> Credential for Box<T> {
    fn identifier(&self) -> CredentialId {
        (**self).identifier()
    }

    fn secret_key(&self) -> &SecretKey {
        (**self).secret_key()
    }

    fn description(&self) -> &str {
        (**self).description()
    }
}

impl<T: Credential + ?Sized> Credential for Arc<T> {
    fn identifier(&self) -> CredentialId {
        (**self).identifier()
    }

    fn secret_key(&self) -> &SecretKey {
        (**self).secret_key()
    }

    fn description(&self) -> &str {
        (**self).description()
    }
}

// ============================================================================
// SECTION: API Key Credential
// ============================================================================

/// Credential backed by a single API key.
///
/// # Invariants
/// - Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyCredential {
    /// Secret key presented to the remote service.
    key: SecretKey,
    /// Operator-facing description.
    description: String,
}

impl ApiKeyCredential {
    /// Creates an API key credential.
    #[must_use]
    pub fn new(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: SecretKey::new(key),
            description: description.into(),
        }
    }
}

impl Credential for ApiKeyCredential {
    fn identifier(&self) -> CredentialId {
        self.key.redacted_id()
    }

    fn secret_key(&self) -> &SecretKey {
        &self.key
    }

    fn description(&self) -> &str {
        &self.description
    }
}

// ============================================================================
// SECTION: Listing Helpers
// ============================================================================

/// Returns credentials deduplicated by identifier, keeping the first seen.
#[must_use]
pub fn unique_credentials<C: Credential>(credentials: &[C]) -> Vec<&C> {
    let mut seen = BTreeSet::new();
    credentials.iter().filter(|credential| seen.insert(credential.identifier())).collect()
}

/// Returns the description, or the identifier when the description is blank.
#[must_use]
pub fn display_label<C: Credential + ?Sized>(credential: &C) -> String {
    let description = credential.description().trim();
    if description.is_empty() {
        credential.identifier().to_string()
    } else {
        description.to_string()
    }
}
