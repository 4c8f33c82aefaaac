//! Organization facade.

use crate::client::GitHubClient;
use crate::entity::Metadata;
use crate::errors::GitHubResult;
use crate::pagination::Paginator;
use crate::resources::common;
use crate::search::SearchQuery;
use serde_json::Value;

/// An organization-scoped view of the API.
///
/// Binds a client to `orgs/{organization}`. Organization metadata is
/// fetched lazily on first [`metadata`](Self::metadata) field access.
pub struct Organization {
    client: GitHubClient,
    organization: String,
    endpoint: String,
    metadata: Metadata,
}

impl Organization {
    /// Creates a facade for `organization`.
    ///
    /// The token needs the `admin:org` scope for most operations.
    pub fn new(client: GitHubClient, organization: impl Into<String>) -> Self {
        let organization = organization.into();
        let endpoint = format!("orgs/{}", organization);
        let metadata = Metadata::new(client.clone(), endpoint.clone());
        Self {
            client,
            organization,
            endpoint,
            metadata,
        }
    }

    /// Gets the organization name.
    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// Gets the lazily fetched organization metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Lists organization repositories, transparently paginated.
    pub fn list_repositories(&self) -> Paginator {
        Paginator::new(self.client.clone(), format!("{}/repos", self.endpoint))
    }

    // Actions variables / secrets / runners

    /// Adds an organization variable.
    pub async fn add_variable(&self, name: &str, value: &str) -> GitHubResult<()> {
        common::add_variable(&self.client, &self.endpoint, name, value).await
    }

    /// Deletes an organization variable.
    pub async fn delete_variable(&self, name: &str) -> GitHubResult<()> {
        common::delete_variable(&self.client, &self.endpoint, name).await
    }

    /// Lists organization variables.
    pub async fn list_variables(&self) -> GitHubResult<Vec<Value>> {
        common::list_variables(&self.client, &self.endpoint).await
    }

    /// Lists organization secrets (metadata only, never values).
    pub async fn list_secrets(&self) -> GitHubResult<Vec<Value>> {
        common::list_secrets(&self.client, &self.endpoint).await
    }

    /// Lists organization self-hosted runners.
    pub async fn list_runners(&self) -> GitHubResult<Vec<Value>> {
        common::list_runners(&self.client, &self.endpoint).await
    }

    /// Deletes an organization self-hosted runner.
    pub async fn delete_runner(&self, runner_id: u64) -> GitHubResult<()> {
        common::delete_runner(&self.client, &self.endpoint, runner_id).await
    }

    // Search

    /// Searches file contents across the organization.
    ///
    /// `target` narrows the match location: a value containing `/` is
    /// treated as a `path:` qualifier, anything else as `filename:`.
    /// Search results are capped at 10 pages by the platform.
    pub async fn find(&self, term: &str, target: &str) -> GitHubResult<Vec<Value>> {
        let location = if target.contains('/') { "path" } else { "filename" };
        let query = SearchQuery::new()
            .term(term)
            .qualifier("org", &self.organization)
            .qualifier("in", "file")
            .qualifier(location, target);

        Paginator::new(self.client.clone(), "search/code")
            .items_key("items")
            .extra_query(query.encode())
            .search_capped()
            .collect_all()
            .await
    }

    /// Searches the organization's pull requests by state and author,
    /// keeping only unlocked ones.
    pub async fn get_pull_requests(&self, state: &str, author: &str) -> GitHubResult<Vec<Value>> {
        let query = SearchQuery::new()
            .qualifier("state", state)
            .qualifier("type", "pr")
            .qualifier("org", &self.organization)
            .qualifier("author", author);

        let items = Paginator::new(self.client.clone(), "search/issues")
            .items_key("items")
            .extra_query(query.encode())
            .search_capped()
            .collect_all()
            .await?;

        Ok(items
            .into_iter()
            .filter(|pr| !pr["locked"].as_bool().unwrap_or(false))
            .collect())
    }
}
