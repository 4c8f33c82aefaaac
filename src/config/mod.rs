//! Configuration types for the GitHub client.

use crate::auth::Token;
use crate::errors::{GitHubError, GitHubErrorKind};
use std::time::Duration;

/// Default GitHub API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Default GitHub API version (date-based).
pub const DEFAULT_API_VERSION: &str = "2022-11-28";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Default backoff between attempts after a network timeout.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Default delay between dispatcher run-correlation polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default User-Agent header.
pub const DEFAULT_USER_AGENT: &str = "github-ops/0.1.0";

/// Retry behavior for network timeouts.
///
/// Timed-out requests are re-sent identically after a fixed backoff. With
/// `max_attempts` unset the client retries forever, matching the behavior
/// automation scripts historically relied on; set a cap to surface
/// [`GitHubErrorKind::RetriesExhausted`](crate::errors::GitHubErrorKind)
/// instead.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Fixed backoff between attempts.
    pub backoff: Duration,
    /// Maximum attempts; `None` retries indefinitely.
    pub max_attempts: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            backoff: DEFAULT_RETRY_BACKOFF,
            max_attempts: None,
        }
    }
}

/// Polling behavior for the workflow dispatcher.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between run-list polls.
    pub interval: Duration,
    /// Maximum polls; `None` polls until a run is found.
    pub max_attempts: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
        }
    }
}

/// GitHub client configuration.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// API base URL.
    pub base_url: String,
    /// API version header.
    pub api_version: String,
    /// Bearer token.
    pub token: Option<Token>,
    /// Request timeout.
    pub timeout: Duration,
    /// User-Agent header.
    pub user_agent: String,
    /// Timeout retry configuration.
    pub retry: RetryConfig,
    /// Dispatcher poll configuration.
    pub poll: PollConfig,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry: RetryConfig::default(),
            poll: PollConfig::default(),
        }
    }
}

impl GitHubConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> GitHubConfigBuilder {
        GitHubConfigBuilder::new()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), GitHubError> {
        if self.base_url.is_empty() {
            return Err(GitHubError::new(
                GitHubErrorKind::InvalidBaseUrl,
                "Base URL cannot be empty",
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(GitHubError::new(
                GitHubErrorKind::InvalidBaseUrl,
                "Base URL must start with http:// or https://",
            ));
        }

        if self.user_agent.is_empty() {
            return Err(GitHubError::configuration(
                "User-Agent is required by GitHub API",
            ));
        }

        if self.token.is_none() {
            return Err(GitHubError::new(
                GitHubErrorKind::MissingToken,
                "Bearer token required",
            ));
        }

        Ok(())
    }
}

/// Builder for GitHubConfig.
#[derive(Debug, Default)]
pub struct GitHubConfigBuilder {
    base_url: Option<String>,
    api_version: Option<String>,
    token: Option<Token>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    retry: Option<RetryConfig>,
    poll: Option<PollConfig>,
}

impl GitHubConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the API version.
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Sets the bearer token.
    pub fn token(mut self, token: impl Into<Token>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the User-Agent header.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the timeout retry configuration.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = Some(config);
        self
    }

    /// Caps timeout retries at `max_attempts`.
    pub fn max_retries(mut self, max_attempts: u32) -> Self {
        let mut retry = self.retry.take().unwrap_or_default();
        retry.max_attempts = Some(max_attempts);
        self.retry = Some(retry);
        self
    }

    /// Sets the dispatcher poll configuration.
    pub fn poll(mut self, config: PollConfig) -> Self {
        self.poll = Some(config);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> Result<GitHubConfig, GitHubError> {
        let config = GitHubConfig {
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_version: self
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            token: self.token,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            user_agent: self
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            retry: self.retry.unwrap_or_default(),
            poll: self.poll.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}
