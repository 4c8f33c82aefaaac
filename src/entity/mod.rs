//! Lazily fetched resource metadata.

use crate::client::GitHubClient;
use crate::errors::{GitHubError, GitHubResult};
use serde_json::{Map, Value};
use tokio::sync::OnceCell;

/// A resource's backing JSON object, fetched on first field access.
///
/// Construction stores only the endpoint; the network cost is paid only if
/// a field is actually read. The first [`field`](Self::field) call fetches
/// the full resource exactly once and caches every returned field; the
/// cache is read-only afterwards. Re-fetching requires a new instance.
pub struct Metadata {
    client: GitHubClient,
    endpoint: String,
    fields: OnceCell<Map<String, Value>>,
}

impl Metadata {
    /// Creates unloaded metadata for the resource at `endpoint`.
    pub fn new(client: GitHubClient, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            fields: OnceCell::new(),
        }
    }

    /// Gets a field, fetching the backing resource on first access.
    ///
    /// Fails with
    /// [`GitHubErrorKind::UnknownField`](crate::errors::GitHubErrorKind)
    /// when the fetched resource has no such field.
    pub async fn field(&self, name: &str) -> GitHubResult<Value> {
        let fields = self
            .fields
            .get_or_try_init(|| async {
                tracing::debug!(endpoint = %self.endpoint, "Fetching resource metadata");
                match self.client.get(&self.endpoint).await? {
                    Value::Object(map) => Ok(map),
                    other => Err(GitHubError::deserialization(format!(
                        "Expected a JSON object for {}, got {}",
                        self.endpoint, other
                    ))),
                }
            })
            .await?;

        fields
            .get(name)
            .cloned()
            .ok_or_else(|| GitHubError::unknown_field(name))
    }

    /// Gets a field's string value.
    pub async fn string_field(&self, name: &str) -> GitHubResult<String> {
        match self.field(name).await? {
            Value::String(s) => Ok(s),
            other => Err(GitHubError::deserialization(format!(
                "Field {} is not a string: {}",
                name, other
            ))),
        }
    }

    /// Returns the currently known field names, for tooling and debugging.
    ///
    /// Empty until the first field access triggers the fetch.
    pub fn known_fields(&self) -> Vec<String> {
        self.fields
            .get()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns true once the backing resource has been fetched.
    pub fn is_loaded(&self) -> bool {
        self.fields.get().is_some()
    }
}
