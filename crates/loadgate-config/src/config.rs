// crates/loadgate-config/src/config.rs
// ============================================================================
// Module: Load Gate Configuration
// Description: Configuration loading and validation for Load Gate.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: loadgate-core, loadgate-client, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed. Threshold ranges are the one
//! exception: they are carried as written and checked by the gate runtime, so
//! an out-of-range threshold yields a `NotBuilt` verdict rather than a load
//! failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use loadgate_client::HttpClientConfig;
use loadgate_core::ApiKeyCredential;
use loadgate_core::CredentialDefaults;
use loadgate_core::GateRequest;
use loadgate_core::PollPolicy;
use loadgate_core::RetryPolicy;
use loadgate_core::TestId;
use loadgate_core::ThresholdConfig;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "loadgate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "LOADGATE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of configured API keys.
pub(crate) const MAX_API_KEYS: usize = 64;
/// Maximum length of a configured API key.
pub(crate) const MAX_API_KEY_LENGTH: usize = 512;
/// Maximum poll interval in seconds.
pub(crate) const MAX_INTERVAL_SEC: u64 = 3_600;
/// Maximum grace margin in seconds.
pub(crate) const MAX_GRACE_SEC: u64 = 86_400;
/// Maximum settle delay in seconds.
pub(crate) const MAX_SETTLE_DELAY_SEC: u64 = 3_600;
/// Maximum retries of one status fetch.
pub(crate) const MAX_RETRIES: u32 = 10;
/// Maximum initial retry backoff in milliseconds.
pub(crate) const MAX_RETRY_BACKOFF_MS: u64 = 60_000;
/// Maximum retry backoff multiplier.
pub(crate) const MAX_RETRY_MULTIPLIER: u32 = 10;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Load Gate configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadGateConfig {
    /// Remote service connection settings.
    #[serde(default)]
    pub service: HttpClientConfig,
    /// Configured API keys and the fallback identifier.
    #[serde(default)]
    pub credentials: CredentialsConfig,
    /// Gate invocation defaults.
    #[serde(default)]
    pub gate: GateConfig,
    /// Completion poller timing.
    #[serde(default)]
    pub polling: PollingConfig,
}

impl LoadGateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", resolved.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.service
            .validate()
            .map_err(|err| ConfigError::Invalid(format!("service: {err}")))?;
        self.credentials.validate()?;
        self.polling.validate()
    }

    /// Builds the gate request, applying command-line overrides.
    #[must_use]
    pub fn gate_request(&self, test_id: Option<&str>, api_key_id: Option<&str>) -> GateRequest {
        GateRequest {
            api_key_id: api_key_id.unwrap_or(&self.gate.api_key_id).to_string(),
            test_id: TestId::new(test_id.unwrap_or(&self.gate.test_id)),
            thresholds: self.gate.thresholds,
        }
    }
}

// ============================================================================
// SECTION: Credentials
// ============================================================================

/// Credential store configuration.
///
/// # Invariants
/// - Each key entry names exactly one source: inline or environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsConfig {
    /// Process-wide fallback credential identifier.
    #[serde(default)]
    pub default_id: String,
    /// Configured API keys.
    #[serde(default)]
    pub keys: Vec<ApiKeyEntry>,
}

impl CredentialsConfig {
    /// Returns the defaults injected into the credential resolver.
    #[must_use]
    pub fn defaults(&self) -> CredentialDefaults {
        CredentialDefaults {
            default_id: self.default_id.clone(),
        }
    }

    /// Materializes credentials, reading keys from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a referenced variable is unset.
    pub fn materialize(&self) -> Result<Vec<ApiKeyCredential>, ConfigError> {
        self.materialize_with(|name| env::var(name).ok())
    }

    /// Materializes credentials using the provided variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a referenced variable is unset.
    pub fn materialize_with<F>(&self, lookup: F) -> Result<Vec<ApiKeyCredential>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.keys
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let key = match (&entry.api_key, &entry.api_key_env) {
                    (Some(key), _) => key.clone(),
                    (None, Some(name)) => lookup(name).ok_or_else(|| {
                        ConfigError::Invalid(format!(
                            "credentials.keys[{index}]: environment variable {name} is not set"
                        ))
                    })?,
                    (None, None) => {
                        return Err(ConfigError::Invalid(format!(
                            "credentials.keys[{index}] has no key source"
                        )));
                    }
                };
                Ok(ApiKeyCredential::new(key, entry.description.clone()))
            })
            .collect()
    }

    /// Validates key entry shape and limits.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.keys.len() > MAX_API_KEYS {
            return Err(ConfigError::Invalid(format!(
                "credentials.keys exceeds max entries ({MAX_API_KEYS})"
            )));
        }
        for (index, entry) in self.keys.iter().enumerate() {
            match (&entry.api_key, &entry.api_key_env) {
                (Some(_), Some(_)) | (None, None) => {
                    return Err(ConfigError::Invalid(format!(
                        "credentials.keys[{index}] must set exactly one of api_key or api_key_env"
                    )));
                }
                (Some(key), None) if key.len() > MAX_API_KEY_LENGTH => {
                    return Err(ConfigError::Invalid(format!(
                        "credentials.keys[{index}].api_key exceeds max length"
                    )));
                }
                (None, Some(name)) if name.trim().is_empty() => {
                    return Err(ConfigError::Invalid(format!(
                        "credentials.keys[{index}].api_key_env must be non-empty"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// One configured API key.
///
/// # Invariants
/// - `Debug` never prints the inline key.
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiKeyEntry {
    /// Inline API key.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Operator-facing description.
    #[serde(default)]
    pub description: String,
}

impl fmt::Debug for ApiKeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyEntry")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_env", &self.api_key_env)
            .field("description", &self.description)
            .finish()
    }
}

// ============================================================================
// SECTION: Gate and Polling
// ============================================================================

/// Gate invocation defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateConfig {
    /// Configured credential identifier (may be empty).
    #[serde(default)]
    pub api_key_id: String,
    /// Test to run.
    #[serde(default)]
    pub test_id: String,
    /// Thresholds; ranges are checked by the runtime, not at load.
    #[serde(default)]
    pub thresholds: ThresholdConfig,
}

/// Completion poller timing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollingConfig {
    /// Seconds between status fetches.
    pub interval_sec: u64,
    /// Grace margin beyond the declared run duration, in seconds.
    pub grace_sec: u64,
    /// Delay between completion and the summary fetch, in seconds.
    pub settle_delay_sec: u64,
    /// Retries of a transient status-fetch failure (0 disables retries).
    pub max_retries: u32,
    /// Backoff before the first retry, in milliseconds.
    pub retry_backoff_ms: u64,
    /// Backoff multiplier applied after each retry.
    pub retry_multiplier: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        let policy = PollPolicy::default();
        Self {
            interval_sec: policy.interval.as_secs(),
            grace_sec: policy.grace.as_secs(),
            settle_delay_sec: policy.settle_delay.as_secs(),
            max_retries: policy.retry.max_retries,
            retry_backoff_ms: u64::try_from(policy.retry.initial_backoff.as_millis())
                .unwrap_or(u64::MAX),
            retry_multiplier: policy.retry.multiplier,
        }
    }
}

impl PollingConfig {
    /// Returns the poller policy described by this configuration.
    #[must_use]
    pub const fn policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.interval_sec),
            grace: Duration::from_secs(self.grace_sec),
            settle_delay: Duration::from_secs(self.settle_delay_sec),
            retry: RetryPolicy {
                max_retries: self.max_retries,
                initial_backoff: Duration::from_millis(self.retry_backoff_ms),
                multiplier: self.retry_multiplier,
            },
        }
    }

    /// Validates timing bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        check_range("polling.interval_sec", self.interval_sec, 1, MAX_INTERVAL_SEC)?;
        check_range("polling.grace_sec", self.grace_sec, 0, MAX_GRACE_SEC)?;
        check_range("polling.settle_delay_sec", self.settle_delay_sec, 0, MAX_SETTLE_DELAY_SEC)?;
        check_range(
            "polling.max_retries",
            u64::from(self.max_retries),
            0,
            u64::from(MAX_RETRIES),
        )?;
        check_range("polling.retry_backoff_ms", self.retry_backoff_ms, 1, MAX_RETRY_BACKOFF_MS)?;
        check_range(
            "polling.retry_multiplier",
            u64::from(self.retry_multiplier),
            1,
            u64::from(MAX_RETRY_MULTIPLIER),
        )
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Rejects values outside `[min, max]`.
fn check_range(field: &str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between {min} and {max} (got {value})"
        )));
    }
    Ok(())
}
