//! Client configuration
//!
//! Layered as defaults, then an optional file, then `UNIDASH__`-prefixed
//! environment variables (`UNIDASH__API__BASE_URL=...`).

use crate::validation::{ValidateConfig, validators};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Complete client configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnidashConfig {
    /// Data API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Identity provider settings
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Session lifecycle settings
    #[serde(default)]
    pub session: SessionConfig,
}

/// Data API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every API path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Default page size for record listings
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// Identity provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Identity provider project URL
    #[serde(default = "default_identity_url")]
    pub url: String,
    /// Public (anonymous) API key sent with every identity call
    #[serde(default)]
    pub anon_key: String,
    /// Upper bound on a single session refresh, in seconds
    #[serde(default = "default_timeout_secs")]
    pub refresh_timeout_secs: u64,
}

/// Session lifecycle configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Inactivity period before forced sign-out, in seconds
    #[serde(default = "default_inactivity_timeout")]
    pub inactivity_timeout_secs: u64,
    /// How long before sign-out the warning appears, in seconds
    #[serde(default = "default_warning_lead")]
    pub warning_lead_secs: u64,
    /// What the gateway does when a session cannot be refreshed
    #[serde(default)]
    pub refresh_failure: RefreshFailurePolicy,
}

/// Terminal action taken when a 401 cannot be recovered by refreshing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum RefreshFailurePolicy {
    /// Sign out (best effort) and hand the unauthorized error to the caller
    #[default]
    SignOut,
    /// Navigate the whole client to an unauthenticated entry point
    Redirect { location: String },
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_identity_url() -> String {
    "http://localhost:54321".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_page_size() -> u32 {
    20
}

const fn default_inactivity_timeout() -> u64 {
    30 * 60
}

const fn default_warning_lead() -> u64 {
    60
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            url: default_identity_url(),
            anon_key: String::new(),
            refresh_timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout_secs: default_inactivity_timeout(),
            warning_lead_secs: default_warning_lead(),
            refresh_failure: RefreshFailurePolicy::default(),
        }
    }
}

impl ApiConfig {
    /// Request timeout as a duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl IdentityConfig {
    /// Refresh bound as a duration
    #[must_use]
    pub const fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }
}

impl SessionConfig {
    /// Inactivity timeout as a duration
    #[must_use]
    pub const fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_secs)
    }

    /// Warning lead as a duration
    #[must_use]
    pub const fn warning_lead(&self) -> Duration {
        Duration::from_secs(self.warning_lead_secs)
    }
}

impl UnidashConfig {
    /// Load configuration from the default file locations and environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        for path in ["unidash", "config/unidash"] {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        let config: Self = builder
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file, with environment overrides
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("UNIDASH")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

impl ValidateConfig for UnidashConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        validators::validate_url(&self.api.base_url, "api.base_url")?;
        validators::validate_range(self.api.timeout_secs, 1, 600, "api.timeout_secs")?;
        validators::validate_range(self.api.page_size, 1, 1000, "api.page_size")?;

        validators::validate_url(&self.identity.url, "identity.url")?;
        validators::validate_range(
            self.identity.refresh_timeout_secs,
            1,
            600,
            "identity.refresh_timeout_secs",
        )?;

        if self.session.inactivity_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "session.inactivity_timeout_secs must be positive".to_string(),
            ));
        }
        if let RefreshFailurePolicy::Redirect { location } = &self.session.refresh_failure {
            validators::validate_not_empty(location, "session.refresh_failure.location")?;
        }

        Ok(())
    }
}
