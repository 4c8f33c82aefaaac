//! Bearer-token credentials for the GitHub API.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// An opaque bearer token, held for the lifetime of a client.
///
/// The token is a personal access token or an Actions `GITHUB_TOKEN`; the
/// library only injects it as an `Authorization: Bearer` header and never
/// logs it.
#[derive(Clone)]
pub struct Token(SecretString);

impl Token {
    /// Wraps a token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::new(token.into()))
    }

    /// Renders the `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0.expose_secret())
    }

    /// Gets a redacted prefix for logging.
    pub fn prefix(&self) -> &'static str {
        let exposed = self.0.expose_secret();
        if exposed.starts_with("ghp_") {
            "ghp_***"
        } else if exposed.starts_with("github_pat_") {
            "github_pat_***"
        } else if exposed.starts_with("ghs_") {
            "ghs_***"
        } else {
            "***"
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Token").field(&self.prefix()).finish()
    }
}

impl From<String> for Token {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}

impl From<&str> for Token {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}
