//! Configuration loading via `ortho-config`.

use std::fmt;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::credentials::{CredentialError, resolve_access_token};
use crate::secret::Secret;

/// Management API settings derived from environment variables,
/// configuration files, and CLI flags.
#[derive(Clone, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "ARM")]
pub struct ArmConfig {
    /// Subscription that owns every managed server. This value is required.
    pub subscription_id: String,
    /// Bearer token for the management API.
    pub access_token: Option<String>,
    /// Path to a file holding the bearer token, as an alternative to
    /// `access_token`.
    pub access_token_file: Option<String>,
    /// Base URL of the management API.
    #[ortho_config(default = "https://management.azure.com".to_owned())]
    pub endpoint: String,
    /// Value sent as the `api-version` query parameter.
    #[ortho_config(default = "2017-12-01".to_owned())]
    pub api_version: String,
    /// Resource provider hosting the servers.
    #[ortho_config(default = "Microsoft.DBforMySQL".to_owned())]
    pub provider_namespace: String,
    /// Seconds between long-running operation polls.
    #[ortho_config(default = 10)]
    pub poll_interval_secs: u64,
    /// Per-request HTTP timeout in seconds.
    #[ortho_config(default = 60)]
    pub http_timeout_secs: u64,
}

impl fmt::Debug for ArmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArmConfig")
            .field("subscription_id", &self.subscription_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("access_token_file", &self.access_token_file)
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("provider_namespace", &self.provider_namespace)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl ArmConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to [arm] in dbserver.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    fn require_positive(value: u64, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value == 0 {
            return Err(ConfigError::Invalid(format!(
                "{} must be greater than zero: set {} or {} in dbserver.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration using the `ortho-config` derive. Values merge
    /// defaults, configuration files, environment variables, and CLI flags in
    /// that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge sources.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("dbserver")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation. Error messages include guidance on how to
    /// provide missing values via environment variables or configuration
    /// files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty,
    /// [`ConfigError::Invalid`] when a duration is zero, and
    /// [`ConfigError::Credentials`] when the access token cannot be resolved.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.subscription_id,
            &FieldMetadata::new("subscription ID", "ARM_SUBSCRIPTION_ID", "subscription_id"),
        )?;
        Self::require_field(
            &self.endpoint,
            &FieldMetadata::new("management endpoint", "ARM_ENDPOINT", "endpoint"),
        )?;
        Self::require_field(
            &self.api_version,
            &FieldMetadata::new("API version", "ARM_API_VERSION", "api_version"),
        )?;
        Self::require_field(
            &self.provider_namespace,
            &FieldMetadata::new(
                "provider namespace",
                "ARM_PROVIDER_NAMESPACE",
                "provider_namespace",
            ),
        )?;
        Self::require_positive(
            self.poll_interval_secs,
            &FieldMetadata::new("poll interval", "ARM_POLL_INTERVAL_SECS", "poll_interval_secs"),
        )?;
        Self::require_positive(
            self.http_timeout_secs,
            &FieldMetadata::new("HTTP timeout", "ARM_HTTP_TIMEOUT_SECS", "http_timeout_secs"),
        )?;
        self.access_token().map(|_| ())
    }

    /// Resolves the bearer token from `access_token` or `access_token_file`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Credentials`] when neither or both sources are
    /// set, or when the file cannot be read.
    pub fn access_token(&self) -> Result<Secret, ConfigError> {
        resolve_access_token(
            self.access_token.as_deref(),
            self.access_token_file.as_deref(),
        )
        .map_err(ConfigError::from)
    }

    /// Delay between long-running operation polls.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Per-request HTTP timeout.
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a field holds a value outside its accepted range.
    #[error("invalid configuration value: {0}")]
    Invalid(String),
    /// Surfaces access-token resolution failures.
    #[error(transparent)]
    Credentials(#[from] CredentialError),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
