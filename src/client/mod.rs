//! GitHub API client implementation.

use crate::auth::Token;
use crate::config::{GitHubConfig, GitHubConfigBuilder};
use crate::errors::{GitHubError, GitHubErrorKind, GitHubResult};
use futures::StreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio::time::sleep;

/// GitHub API client.
///
/// Cheap to clone; every clone shares the underlying connection pool.
#[derive(Clone)]
pub struct GitHubClient {
    /// HTTP client.
    http: Client,
    /// Configuration.
    config: GitHubConfig,
    /// Bearer token.
    token: Token,
}

impl GitHubClient {
    /// Creates a new GitHub client.
    pub fn new(config: GitHubConfig) -> GitHubResult<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                GitHubError::configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        let token = config.token.clone().ok_or_else(|| {
            GitHubError::new(GitHubErrorKind::MissingToken, "Bearer token required")
        })?;

        Ok(Self {
            http,
            config,
            token,
        })
    }

    /// Creates a new client builder.
    pub fn builder() -> GitHubClientBuilder {
        GitHubClientBuilder::new()
    }

    /// Gets the base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Gets the configuration.
    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    // HTTP methods

    /// Makes a GET request.
    pub async fn get(&self, path: &str) -> GitHubResult<Value> {
        self.execute(Method::GET, path, Option::<&()>::None).await
    }

    /// Makes a POST request.
    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> GitHubResult<Value> {
        self.execute(Method::POST, path, Some(body)).await
    }

    /// Makes a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> GitHubResult<Value> {
        self.execute(Method::POST, path, Option::<&()>::None).await
    }

    /// Makes a PUT request.
    pub async fn put<B: Serialize>(&self, path: &str, body: &B) -> GitHubResult<Value> {
        self.execute(Method::PUT, path, Some(body)).await
    }

    /// Makes a PATCH request.
    pub async fn patch<B: Serialize>(&self, path: &str, body: &B) -> GitHubResult<Value> {
        self.execute(Method::PATCH, path, Some(body)).await
    }

    /// Makes a DELETE request.
    pub async fn delete(&self, path: &str) -> GitHubResult<Value> {
        self.execute(Method::DELETE, path, Option::<&()>::None)
            .await
    }

    /// Executes a request against a path relative to the base URL.
    ///
    /// The body, if any, is serialized as JSON. A network timeout re-sends
    /// the identical request after the configured fixed backoff; unless a
    /// retry cap is configured this repeats indefinitely. HTTP 200 and 201
    /// decode the JSON body; other success statuses (e.g. 204 from a
    /// workflow dispatch) yield [`Value::Null`]; any non-success status
    /// fails with the status code and body attached.
    pub async fn execute<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> GitHubResult<Value> {
        let url = self.build_url(path);

        let body_bytes = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| {
                GitHubError::new(
                    GitHubErrorKind::InvalidParameter,
                    format!("Failed to serialize request body: {}", e),
                )
            })?;

        let response = self.send_with_retry(method, &url, body_bytes).await?;
        self.decode_response(response).await
    }

    /// Downloads an object from an absolute URL into a local file.
    ///
    /// The body is streamed to disk chunk by chunk. Any status other than
    /// 200 fails with an explicit error and leaves no output file behind.
    pub async fn download(&self, url: &str, output_file: impl AsRef<Path>) -> GitHubResult<()> {
        tracing::debug!(url = %url, "download");

        let response = self
            .prepare(Method::GET, url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(GitHubError::http_status(status.as_u16(), body));
        }

        let mut file = tokio::fs::File::create(output_file.as_ref()).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                GitHubError::new(
                    GitHubErrorKind::ConnectionFailed,
                    format!("Download interrupted: {}", e),
                )
            })?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        Ok(())
    }

    // Internal methods

    async fn send_with_retry(
        &self,
        method: Method,
        url: &str,
        body_bytes: Option<Vec<u8>>,
    ) -> GitHubResult<Response> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let mut request = self.prepare(method.clone(), url);
            if let Some(ref bytes) = body_bytes {
                request = request
                    .header(CONTENT_TYPE, "application/json")
                    .body(bytes.clone());
            }

            match request.send().await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_timeout() => {
                    if let Some(max) = self.config.retry.max_attempts {
                        if attempt >= max {
                            return Err(GitHubError::new(
                                GitHubErrorKind::RetriesExhausted,
                                format!("Request timed out after {} attempts", attempt),
                            )
                            .with_cause(e));
                        }
                    }
                    tracing::debug!(
                        attempt = attempt,
                        backoff_ms = self.config.retry.backoff.as_millis() as u64,
                        url = %url,
                        "Timed out, retrying"
                    );
                    sleep(self.config.retry.backoff).await;
                }
                Err(e) => return Err(self.transport_error(e)),
            }
        }
    }

    async fn decode_response(&self, response: Response) -> GitHubResult<Value> {
        let status = response.status();

        if status == StatusCode::OK || status == StatusCode::CREATED {
            let text = response.text().await.map_err(|e| {
                GitHubError::deserialization(format!("Failed to read response body: {}", e))
            })?;
            if text.is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&text).map_err(|e| {
                GitHubError::deserialization(format!("Failed to parse response: {}", e))
            });
        }

        // 204 and friends: success without a decodable body.
        if status.is_success() {
            return Ok(Value::Null);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), body = %body, "API error");
        Err(GitHubError::http_status(status.as_u16(), body))
    }

    fn prepare(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header(AUTHORIZATION, self.token.bearer())
            .header(USER_AGENT, &self.config.user_agent)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", &self.config.api_version)
    }

    fn transport_error(&self, e: reqwest::Error) -> GitHubError {
        if e.is_timeout() {
            GitHubError::timeout(format!("Request timed out: {}", e))
        } else if e.is_connect() {
            GitHubError::new(
                GitHubErrorKind::ConnectionFailed,
                format!("Connection failed: {}", e),
            )
        } else {
            GitHubError::new(GitHubErrorKind::Unknown, format!("Request failed: {}", e))
        }
    }

    /// Builds a full request URL from a base-relative path.
    pub fn build_url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path.replace(' ', "%20"))
    }
}

/// Builder for GitHubClient.
pub struct GitHubClientBuilder {
    config_builder: GitHubConfigBuilder,
}

impl GitHubClientBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            config_builder: GitHubConfig::builder(),
        }
    }

    /// Sets the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.base_url(url);
        self
    }

    /// Sets the bearer token.
    pub fn token(mut self, token: impl Into<Token>) -> Self {
        self.config_builder = self.config_builder.token(token);
        self
    }

    /// Sets the timeout.
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config_builder = self.config_builder.timeout(timeout);
        self
    }

    /// Sets the User-Agent.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.user_agent(ua);
        self
    }

    /// Caps timeout retries.
    pub fn max_retries(mut self, max_attempts: u32) -> Self {
        self.config_builder = self.config_builder.max_retries(max_attempts);
        self
    }

    /// Builds the client.
    pub fn build(self) -> GitHubResult<GitHubClient> {
        let config = self.config_builder.build()?;
        GitHubClient::new(config)
    }
}

impl Default for GitHubClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
