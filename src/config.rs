//! Client configuration.

use std::time::Duration;

use url::Url;

use crate::error::{DriveError, Result};
use crate::retry::RetryConfig;

pub const DEFAULT_BASE_URL: &str = "https://drive.api.tekcloud.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_ACCESS_KEY: &str = "TEKDRIVE_ACCESS_KEY";
pub const ENV_BASE_URL: &str = "TEKDRIVE_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "TEKDRIVE_TIMEOUT_SECS";

/// Settings shared by every request a client makes.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    /// Applied to each HTTP call, including storage transfers.
    pub timeout: Duration,
    pub retry: RetryConfig,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryConfig::default(),
            user_agent: format!("tekdrive-rs/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Defaults overridden by `TEKDRIVE_BASE_URL` and `TEKDRIVE_TIMEOUT_SECS` when set.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();

        if let Ok(base_url) = std::env::var(ENV_BASE_URL) {
            builder = builder.base_url(&base_url);
        }
        if let Ok(secs) = std::env::var(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                DriveError::Config(format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds, got '{secs}'"))
            })?;
            builder = builder.timeout(Duration::from_secs(secs));
        }

        builder.build()
    }

    /// Resolve an API path against the base URL.
    pub fn url_for(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }
}

#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    retry: Option<RetryConfig>,
    user_agent: Option<String>,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        let mut config = ClientConfig::default();

        if let Some(base_url) = self.base_url {
            let url = Url::parse(&base_url)
                .map_err(|e| DriveError::Config(format!("invalid base URL '{base_url}': {e}")))?;
            if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
                return Err(DriveError::Config(format!(
                    "base URL must be an http(s) URL, got '{base_url}'"
                )));
            }
            config.base_url = url;
        }
        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err(DriveError::Config("timeout must be greater than zero".to_string()));
            }
            config.timeout = timeout;
        }
        if let Some(retry) = self.retry {
            config.retry = retry;
        }
        if let Some(user_agent) = self.user_agent {
            config.user_agent = user_agent;
        }

        Ok(config)
    }
}
