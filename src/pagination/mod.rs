//! Page-cursor pagination for GitHub list endpoints.

use crate::client::GitHubClient;
use crate::errors::{GitHubError, GitHubResult};
use serde_json::Value;

/// Items requested per page (the API maximum).
pub const PER_PAGE: u32 = 100;

/// Hard page cap for search endpoints (published platform limit).
pub const SEARCH_MAX_PAGES: u32 = 10;

/// Pull-based iterator over a paginated list endpoint.
///
/// The cursor starts at page 1 and advances once per non-empty page; an
/// empty page ends iteration and is never fetched again. Nothing is
/// buffered beyond the current page, and dropping the paginator early has
/// no side effects. Each facade call builds a fresh paginator, so listings
/// restart from page 1 on every invocation.
pub struct Paginator {
    client: GitHubClient,
    path: String,
    extra_query: String,
    items_key: Option<&'static str>,
    page: u32,
    max_pages: Option<u32>,
    exhausted: bool,
}

impl Paginator {
    /// Creates a paginator over `path`, yielding top-level array items.
    pub fn new(client: GitHubClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
            extra_query: String::new(),
            items_key: None,
            page: 1,
            max_pages: None,
            exhausted: false,
        }
    }

    /// Takes page items from a named member instead of the top-level array
    /// (e.g. `workflow_runs`, `variables`, `items`).
    pub fn items_key(mut self, key: &'static str) -> Self {
        self.items_key = Some(key);
        self
    }

    /// Appends pre-encoded `key=value` filter pairs to every page request.
    pub fn extra_query(mut self, query: impl Into<String>) -> Self {
        self.extra_query = query.into();
        self
    }

    /// Applies the search-endpoint page cap.
    pub fn search_capped(mut self) -> Self {
        self.max_pages = Some(SEARCH_MAX_PAGES);
        self
    }

    /// Fetches the next non-empty page, or `None` once exhausted.
    pub async fn next_page(&mut self) -> GitHubResult<Option<Vec<Value>>> {
        if self.exhausted {
            return Ok(None);
        }

        if let Some(max) = self.max_pages {
            if self.page > max {
                tracing::debug!(path = %self.path, max_pages = max, "Page cap reached");
                self.exhausted = true;
                return Ok(None);
            }
        }

        let mut path = format!("{}?per_page={}&page={}", self.path, PER_PAGE, self.page);
        if !self.extra_query.is_empty() {
            path.push('&');
            path.push_str(&self.extra_query);
        }

        let body = self.client.get(&path).await?;
        let items = self.extract_items(body)?;

        if items.is_empty() {
            self.exhausted = true;
            return Ok(None);
        }

        self.page += 1;
        Ok(Some(items))
    }

    /// Collects the items of every remaining page, in server order.
    pub async fn collect_all(mut self) -> GitHubResult<Vec<Value>> {
        let mut all_items = Vec::new();

        while let Some(page) = self.next_page().await? {
            all_items.extend(page);
        }

        Ok(all_items)
    }

    fn extract_items(&self, body: Value) -> GitHubResult<Vec<Value>> {
        match (self.items_key, body) {
            (None, Value::Array(items)) => Ok(items),
            (Some(key), Value::Object(mut map)) => match map.remove(key) {
                Some(Value::Array(items)) => Ok(items),
                _ => Err(GitHubError::deserialization(format!(
                    "Page response has no `{}` array",
                    key
                ))),
            },
            _ => Err(GitHubError::deserialization(
                "Page response is not a list".to_string(),
            )),
        }
    }
}
