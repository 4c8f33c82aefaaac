//! Search query encoding for the GitHub search endpoints.

use url::form_urlencoded;

/// Builder for a search `q=` parameter.
///
/// Queries are space-joined `key:value` tokens; a bare term has no key.
/// [`encode`](Self::encode) percent-encodes the assembled query the way the
/// search API expects (spaces as `+`).
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    tokens: Vec<String>,
}

impl SearchQuery {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a bare search term.
    pub fn term(mut self, term: impl Into<String>) -> Self {
        self.tokens.push(term.into());
        self
    }

    /// Adds a `key:value` qualifier.
    pub fn qualifier(mut self, key: &str, value: impl AsRef<str>) -> Self {
        self.tokens.push(format!("{}:{}", key, value.as_ref()));
        self
    }

    /// Renders the raw, unencoded query string.
    pub fn raw(&self) -> String {
        self.tokens.join(" ")
    }

    /// Renders the percent-encoded `q=...` parameter.
    pub fn encode(&self) -> String {
        let encoded: String = form_urlencoded::byte_serialize(self.raw().as_bytes()).collect();
        format!("q={}", encoded)
    }
}
