//! Error types for the GitHub client.

use std::fmt;
use thiserror::Error;

/// Result type alias for GitHub operations.
pub type GitHubResult<T> = Result<T, GitHubError>;

/// Error kinds for categorizing GitHub errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitHubErrorKind {
    // Configuration errors
    /// Missing bearer token.
    MissingToken,
    /// Invalid base URL.
    InvalidBaseUrl,
    /// Invalid configuration.
    InvalidConfiguration,

    // Request errors
    /// Invalid parameter.
    InvalidParameter,
    /// Non-success HTTP status returned by the API.
    Http,

    // Network errors
    /// Connection failed.
    ConnectionFailed,
    /// Request timeout.
    Timeout,
    /// Timeout retries exhausted (only with a configured retry cap).
    RetriesExhausted,
    /// Dispatcher poll attempts exhausted (only with a configured poll cap).
    PollExhausted,

    // Response errors
    /// Failed to deserialize response.
    Deserialization,
    /// Lazily fetched metadata has no such field.
    UnknownField,

    // Local I/O errors (downloads, archive extraction)
    /// File system or archive error.
    Io,

    // Generic
    /// Unknown error.
    Unknown,
}

impl fmt::Display for GitHubErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingToken => write!(f, "missing_token"),
            Self::InvalidBaseUrl => write!(f, "invalid_base_url"),
            Self::InvalidConfiguration => write!(f, "invalid_configuration"),
            Self::InvalidParameter => write!(f, "invalid_parameter"),
            Self::Http => write!(f, "http"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::RetriesExhausted => write!(f, "retries_exhausted"),
            Self::PollExhausted => write!(f, "poll_exhausted"),
            Self::Deserialization => write!(f, "deserialization"),
            Self::UnknownField => write!(f, "unknown_field"),
            Self::Io => write!(f, "io"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// GitHub API error with the status code and body available for inspection.
#[derive(Error, Debug)]
pub struct GitHubError {
    /// Error kind.
    kind: GitHubErrorKind,
    /// Error message.
    message: String,
    /// HTTP status code.
    status_code: Option<u16>,
    /// Raw response body, for non-success statuses.
    body: Option<String>,
    /// Underlying cause.
    #[source]
    cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for GitHubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(code) = self.status_code {
            write!(f, " (HTTP {})", code)?;
        }
        Ok(())
    }
}

impl GitHubError {
    /// Creates a new GitHub error.
    pub fn new(kind: GitHubErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            body: None,
            cause: None,
        }
    }

    /// Sets the HTTP status code.
    pub fn with_status(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Sets the raw response body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the underlying cause.
    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Gets the error kind.
    pub fn kind(&self) -> &GitHubErrorKind {
        &self.kind
    }

    /// Gets the HTTP status code.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Gets the raw response body.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    // Convenience constructors

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(GitHubErrorKind::InvalidConfiguration, message)
    }

    /// Creates an error for a non-success HTTP status.
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::new(GitHubErrorKind::Http, format!("HTTP {} error", status))
            .with_status(status)
            .with_body(body)
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(GitHubErrorKind::Timeout, message)
    }

    /// Creates an error for a missing metadata field.
    pub fn unknown_field(name: &str) -> Self {
        Self::new(
            GitHubErrorKind::UnknownField,
            format!("no such field: {}", name),
        )
    }

    /// Creates a deserialization error.
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::new(GitHubErrorKind::Deserialization, message)
    }

    /// Creates a local I/O error.
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(GitHubErrorKind::Io, message)
    }
}

impl From<std::io::Error> for GitHubError {
    fn from(err: std::io::Error) -> Self {
        Self::new(GitHubErrorKind::Io, err.to_string()).with_cause(err)
    }
}

impl From<zip::result::ZipError> for GitHubError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::new(GitHubErrorKind::Io, err.to_string()).with_cause(err)
    }
}
