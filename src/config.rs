use std::env;
use std::time::Duration;

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, ENV_API_KEY, ENV_BASE_URL, ENV_ORGANIZATION,
    ENV_TIMEOUT_SECS,
};
use crate::error::{Result, SdkError};

/// Connection settings shared by every request the SDK sends.
#[derive(Debug, Clone)]
pub struct SdkConfig {
    pub api_key: String,
    /// Base URL without a trailing slash, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Sent as the `OpenAI-Organization` header when present.
    pub organization: Option<String>,
    pub timeout: Duration,
}

impl SdkConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            organization: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Load settings from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    ///
    /// `OPENAI_API_KEY` is required; the base URL, organization and timeout
    /// fall back to defaults when absent. A timeout that does not parse as
    /// whole seconds is ignored.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(ENV_API_KEY).ok_or(SdkError::MissingApiKey {
            env_var: ENV_API_KEY,
        })?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config = config.with_base_url(base_url);
        }
        if let Some(org) = lookup(ENV_ORGANIZATION) {
            config = config.with_organization(org);
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS).and_then(|s| s.trim().parse::<u64>().ok()) {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
