//! Repository facade, including the workflow dispatch/correlate protocol.

use crate::archive;
use crate::client::GitHubClient;
use crate::entity::Metadata;
use crate::errors::{GitHubError, GitHubErrorKind, GitHubResult};
use crate::pagination::Paginator;
use crate::resources::common;
use crate::resources::git_data::{
    BlobEncoding, CreateBlobRequest, CreateCommitRequest, CreatePullRequestRequest,
    CreateRefRequest, CreateTreeEntry, CreateTreeRequest, GitReference, ShaReference,
    TreeEntryType, TreeMode, UpdateRefRequest,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use crypto_box::aead::OsRng;
use crypto_box::PublicKey;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tokio::time::sleep;
use uuid::Uuid;

/// Filters for listing workflow runs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunFilter {
    /// Filter by triggering event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    /// Filter by creation window (e.g. `2024-01-01T00:00:00Z..*`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// Filter by head SHA.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_sha: Option<String>,
    /// Filter by branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Filter by actor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    /// Filter by status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SecretsPublicKey {
    key_id: String,
    key: String,
}

#[derive(Debug, Deserialize)]
struct Review {
    state: Option<String>,
}

/// A repository-scoped view of the API.
///
/// Binds a client to `repos/{owner}/{repo}`. Repository metadata (such as
/// `default_branch`) is fetched lazily on first access.
pub struct Repository {
    client: GitHubClient,
    repository: String,
    endpoint: String,
    metadata: Metadata,
}

impl Repository {
    /// Creates a facade for `repository` (`owner/name`).
    ///
    /// The token needs the `repo` scope for most operations.
    pub fn new(client: GitHubClient, repository: impl Into<String>) -> Self {
        let repository = repository.into();
        let endpoint = format!("repos/{}", repository);
        let metadata = Metadata::new(client.clone(), endpoint.clone());
        Self {
            client,
            repository,
            endpoint,
            metadata,
        }
    }

    /// Gets the full repository name (`owner/name`).
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Gets the repository name without the owner.
    pub fn short_name(&self) -> &str {
        self.repository
            .rsplit('/')
            .next()
            .unwrap_or(&self.repository)
    }

    /// Gets the lazily fetched repository metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    // Actions variables / secrets / runners

    /// Adds a repository variable.
    pub async fn add_variable(&self, name: &str, value: &str) -> GitHubResult<()> {
        common::add_variable(&self.client, &self.endpoint, name, value).await
    }

    /// Deletes a repository variable.
    pub async fn delete_variable(&self, name: &str) -> GitHubResult<()> {
        common::delete_variable(&self.client, &self.endpoint, name).await
    }

    /// Lists repository variables.
    pub async fn list_variables(&self) -> GitHubResult<Vec<Value>> {
        common::list_variables(&self.client, &self.endpoint).await
    }

    /// Lists repository secrets (metadata only, never values).
    pub async fn list_secrets(&self) -> GitHubResult<Vec<Value>> {
        common::list_secrets(&self.client, &self.endpoint).await
    }

    /// Lists repository self-hosted runners.
    pub async fn list_runners(&self) -> GitHubResult<Vec<Value>> {
        common::list_runners(&self.client, &self.endpoint).await
    }

    /// Deletes a repository self-hosted runner.
    pub async fn delete_runner(&self, runner_id: u64) -> GitHubResult<()> {
        common::delete_runner(&self.client, &self.endpoint, runner_id).await
    }

    /// Creates or updates a repository secret.
    ///
    /// The value is sealed with the repository's public key (libsodium
    /// sealed box) before transmission, as the API requires. Returns the
    /// transmitted payload (`encrypted_value` and `key_id`).
    pub async fn add_secret(&self, name: &str, value: &str) -> GitHubResult<Value> {
        let body = self
            .client
            .get(&format!("{}/actions/secrets/public-key", self.endpoint))
            .await?;
        let public_key: SecretsPublicKey = serde_json::from_value(body).map_err(|e| {
            GitHubError::deserialization(format!("Invalid secrets public key: {}", e))
        })?;

        let payload = json!({
            "encrypted_value": seal_secret(&public_key.key, value)?,
            "key_id": public_key.key_id,
        });
        self.client
            .put(
                &format!("{}/actions/secrets/{}", self.endpoint, name),
                &payload,
            )
            .await?;
        Ok(payload)
    }

    // Workflow runs

    /// Lists workflow runs matching `filter`, transparently paginated.
    pub fn list_runs(&self, filter: &RunFilter) -> GitHubResult<Paginator> {
        let query = serde_urlencoded::to_string(filter).map_err(|e| {
            GitHubError::new(
                GitHubErrorKind::InvalidParameter,
                format!("Failed to encode run filter: {}", e),
            )
        })?;

        Ok(Paginator::new(
            self.client.clone(),
            format!("{}/actions/runs", self.endpoint),
        )
        .items_key("workflow_runs")
        .extra_query(query))
    }

    /// Gets a specific workflow run.
    pub async fn get_run(&self, run_id: u64) -> GitHubResult<Value> {
        self.client
            .get(&format!("{}/actions/runs/{}", self.endpoint, run_id))
            .await
    }

    /// Cancels a workflow run.
    pub async fn cancel_run(&self, run_id: u64) -> GitHubResult<()> {
        self.client
            .post_empty(&format!("{}/actions/runs/{}/cancel", self.endpoint, run_id))
            .await?;
        Ok(())
    }

    /// Triggers a workflow dispatch and returns the created run's ID.
    ///
    /// The dispatch endpoint returns no correlation token, so the run is
    /// recovered by diffing run-ID snapshots: the `workflow_dispatch` runs
    /// created from now on (optionally narrowed to `head_sha`) are recorded
    /// before the dispatch, then the same listing is polled and each newly
    /// appeared run checked until one belongs to `workflow` (matched on the
    /// workflow file name). A dispatch rejected with HTTP 422 (validation
    /// error, no run created) returns the sentinel `0` instead of failing.
    ///
    /// The poll repeats at the configured interval, indefinitely unless a
    /// poll cap is configured. Known limitation: two concurrent dispatches
    /// of the same workflow inside one poll window can be mis-correlated;
    /// callers must serialize their own dispatches.
    pub async fn execute_workflow(
        &self,
        workflow: &str,
        payload: &Value,
        head_sha: Option<&str>,
    ) -> GitHubResult<u64> {
        let filter = RunFilter {
            event: Some("workflow_dispatch".to_string()),
            created: Some(format!("{}..*", Utc::now().format("%Y-%m-%dT%H:%M:%SZ"))),
            head_sha: head_sha.map(String::from),
            ..Default::default()
        };

        let current_ids = self.run_ids(&filter).await?;
        tracing::debug!(?current_ids, workflow = %workflow, "Runs before dispatch");

        let dispatch = self
            .client
            .post(
                &format!(
                    "{}/actions/workflows/{}/dispatches",
                    self.endpoint, workflow
                ),
                payload,
            )
            .await;
        match dispatch {
            Ok(_) => {}
            Err(e) if e.status_code() == Some(422) => {
                tracing::warn!(workflow = %workflow, "Dispatch rejected, no run created");
                return Ok(0);
            }
            Err(e) => return Err(e),
        }

        let mut polls: u32 = 0;
        loop {
            if let Some(max) = self.client.config().poll.max_attempts {
                if polls >= max {
                    return Err(GitHubError::new(
                        GitHubErrorKind::PollExhausted,
                        format!("No matching run found after {} polls", polls),
                    ));
                }
            }
            polls += 1;
            sleep(self.client.config().poll.interval).await;

            let new_ids = self.run_ids(&filter).await?;
            tracing::debug!(?new_ids, poll = polls, "Runs after dispatch");

            for run_id in new_ids.difference(&current_ids) {
                let run = self.get_run(*run_id).await?;
                let file_name = run["path"]
                    .as_str()
                    .and_then(|p| p.rsplit('/').next())
                    .unwrap_or_default();
                if file_name == workflow {
                    return Ok(*run_id);
                }
            }
        }
    }

    /// Snapshots the sorted, deduplicated run-ID set for `filter`.
    ///
    /// Listing order is not stable across polls, so correlation works on
    /// the ordered set rather than the raw listing.
    async fn run_ids(&self, filter: &RunFilter) -> GitHubResult<BTreeSet<u64>> {
        let runs = self.list_runs(filter)?.collect_all().await?;
        Ok(runs.iter().filter_map(|r| r["id"].as_u64()).collect())
    }

    // Commits and contents

    /// Lists repository commits, transparently paginated.
    pub fn list_commits(&self) -> Paginator {
        Paginator::new(self.client.clone(), format!("{}/commits", self.endpoint))
    }

    /// Gets the latest commit of a branch.
    pub async fn get_commit(&self, branch: &str) -> GitHubResult<Value> {
        self.client
            .get(&format!("{}/commits/{}", self.endpoint, branch))
            .await
    }

    /// Browses the file structure at `path` on the default branch.
    pub async fn browse(&self, path: &str) -> GitHubResult<Value> {
        let path = path.trim_start_matches('/');
        self.client
            .get(&format!("{}/contents/{}", self.endpoint, path))
            .await
    }

    // Artifacts

    /// Lists the artifacts produced by a specific run.
    pub async fn list_artifacts(&self, run_id: u64) -> GitHubResult<Vec<Value>> {
        let body = self
            .client
            .get(&format!("{}/actions/artifacts", self.endpoint))
            .await?;
        let artifacts = common::collection(body, "artifacts")?;

        Ok(artifacts
            .into_iter()
            .filter(|a| a["workflow_run"]["id"].as_u64() == Some(run_id))
            .collect())
    }

    // Issues and deploy keys

    /// Lists repository issues.
    pub async fn get_issues(&self) -> GitHubResult<Value> {
        self.client.get(&format!("{}/issues", self.endpoint)).await
    }

    /// Lists repository deploy keys.
    pub async fn get_deploy_keys(&self) -> GitHubResult<Value> {
        self.client.get(&format!("{}/keys", self.endpoint)).await
    }

    /// Adds a deploy key. The wire field is `read_only`, so write access is
    /// expressed as its negation.
    pub async fn add_deploy_key(
        &self,
        title: &str,
        key: &str,
        write_access: bool,
    ) -> GitHubResult<Value> {
        self.client
            .post(
                &format!("{}/keys", self.endpoint),
                &json!({"title": title, "key": key, "read_only": !write_access}),
            )
            .await
    }

    // Pull requests

    /// Gets a pull request.
    pub async fn get_pull_request(&self, number: u64) -> GitHubResult<Value> {
        self.client
            .get(&format!("{}/pulls/{}", self.endpoint, number))
            .await
    }

    /// Checks whether a pull request is fully approved.
    ///
    /// No reviews means not approved. Reviews without a state are skipped;
    /// any explicit non-APPROVED state short-circuits to false.
    pub async fn pull_request_approved(&self, number: u64) -> GitHubResult<bool> {
        let body = self
            .client
            .get(&format!("{}/pulls/{}/reviews", self.endpoint, number))
            .await?;
        let reviews: Vec<Review> = serde_json::from_value(body)
            .map_err(|e| GitHubError::deserialization(format!("Invalid review list: {}", e)))?;

        let mut approved = false;
        for review in reviews {
            match review.state.as_deref() {
                Some("APPROVED") => approved = true,
                Some(_) => return Ok(false),
                None => {}
            }
        }
        Ok(approved)
    }

    /// Commits `files` on a new branch and opens a pull request, returning
    /// its HTML URL.
    ///
    /// This is the seven-call git data sequence: one blob per file, the
    /// target branch's tree SHA, the new branch ref, a tree layered on the
    /// target tree, a commit, the ref update, and finally the pull request.
    /// A failure part-way leaves the already-created blobs and ref behind;
    /// there is no rollback.
    pub async fn create_pull_request(
        &self,
        branch: &str,
        commit_message: &str,
        files: &BTreeMap<String, String>,
        target_branch: Option<&str>,
    ) -> GitHubResult<String> {
        let target_branch = match target_branch {
            Some(t) => t.to_string(),
            None => self.metadata.string_field("default_branch").await?,
        };

        let mut entries = Vec::with_capacity(files.len());
        for (path, content) in files {
            let blob: ShaReference = self
                .post_typed(
                    &format!("{}/git/blobs", self.endpoint),
                    &CreateBlobRequest {
                        content: BASE64.encode(content.as_bytes()),
                        encoding: BlobEncoding::Base64,
                    },
                )
                .await?;
            entries.push(CreateTreeEntry {
                path: path.clone(),
                mode: TreeMode::File,
                entry_type: TreeEntryType::Blob,
                sha: blob.sha,
            });
        }

        let target_tree: ShaReference = self
            .get_typed(&format!("{}/git/trees/{}", self.endpoint, target_branch))
            .await?;

        let new_ref: GitReference = self
            .post_typed(
                &format!("{}/git/refs", self.endpoint),
                &CreateRefRequest {
                    ref_name: format!("refs/heads/{}", branch),
                    sha: target_tree.sha,
                },
            )
            .await?;
        let base_sha = new_ref.object.sha;

        let tree: ShaReference = self
            .post_typed(
                &format!("{}/git/trees", self.endpoint),
                &CreateTreeRequest {
                    tree: entries,
                    base_tree: Some(base_sha.clone()),
                },
            )
            .await?;

        let commit: ShaReference = self
            .post_typed(
                &format!("{}/git/commits", self.endpoint),
                &CreateCommitRequest {
                    message: commit_message.to_string(),
                    tree: tree.sha,
                    parents: vec![base_sha],
                },
            )
            .await?;

        self.client
            .patch(
                &format!("{}/git/refs/heads/{}", self.endpoint, branch),
                &UpdateRefRequest { sha: commit.sha },
            )
            .await?;

        let pr = self
            .client
            .post(
                &format!("{}/pulls", self.endpoint),
                &CreatePullRequestRequest {
                    title: commit_message.to_string(),
                    body: commit_message.to_string(),
                    head: branch.to_string(),
                    base: target_branch,
                },
            )
            .await?;

        pr["html_url"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| GitHubError::deserialization("Pull request has no html_url"))
    }

    // Local operations

    /// Downloads and unpacks the repository at `git_ref` into `destination`.
    ///
    /// Defaults: the current directory joined with the repository name, and
    /// the default branch. The zipball's single wrapping directory is
    /// stripped so files land directly in `destination`. Returns the
    /// destination path.
    pub async fn clone_to(
        &self,
        destination: Option<&Path>,
        git_ref: Option<&str>,
    ) -> GitHubResult<PathBuf> {
        let destination = match destination {
            Some(d) => d.to_path_buf(),
            None => std::env::current_dir()?.join(self.short_name()),
        };
        let git_ref = match git_ref {
            Some(r) => r.to_string(),
            None => self.metadata.string_field("default_branch").await?,
        };

        let url = self
            .client
            .build_url(&format!("{}/zipball/{}", self.endpoint, git_ref));
        let scratch = tempfile::Builder::new().suffix(".zip").tempfile()?;
        self.client.download(&url, scratch.path()).await?;
        archive::extract_strip_root(scratch.path(), &destination)?;

        Ok(destination)
    }

    /// Unpacks an artifact archive and appends its contents to `output` as
    /// `KEY=value` lines.
    ///
    /// Each contained file contributes two keys, `{prefix}_{workflow}_{file}`
    /// and `{prefix}_{file}` (uppercased, separators normalized to `_`),
    /// both set to the file's first line. `prefix` defaults to the
    /// repository name.
    pub async fn export_variables(
        &self,
        url: &str,
        workflow: &str,
        output: &Path,
        prefix: Option<&str>,
    ) -> GitHubResult<()> {
        let prefix = prefix.unwrap_or_else(|| self.short_name());
        let scratch = tempfile::tempdir()?;
        let zip_path = scratch.path().join(format!("{}.zip", Uuid::new_v4()));

        self.client.download(url, &zip_path).await?;
        archive::extract(&zip_path, scratch.path())?;

        let mut out = OpenOptions::new().create(true).append(true).open(output)?;
        for file in archive::walk_files(scratch.path())? {
            if file == zip_path {
                continue;
            }
            let value = archive::first_line(&file)?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            for var_prefix in [format!("{}_{}", prefix, workflow), prefix.to_string()] {
                writeln!(out, "{}={}", archive::env_key(&var_prefix, file_name), value)?;
            }
        }

        Ok(())
    }

    // Internal helpers

    async fn get_typed<T: serde::de::DeserializeOwned>(&self, path: &str) -> GitHubResult<T> {
        let body = self.client.get(path).await?;
        serde_json::from_value(body)
            .map_err(|e| GitHubError::deserialization(format!("Unexpected response: {}", e)))
    }

    async fn post_typed<T: serde::de::DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> GitHubResult<T> {
        let response = self.client.post(path, body).await?;
        serde_json::from_value(response)
            .map_err(|e| GitHubError::deserialization(format!("Unexpected response: {}", e)))
    }
}

/// Seals `value` for transmission with a base64-encoded public key.
fn seal_secret(key_b64: &str, value: &str) -> GitHubResult<String> {
    let key_bytes: [u8; 32] = BASE64
        .decode(key_b64)
        .map_err(|e| GitHubError::deserialization(format!("Public key is not base64: {}", e)))?
        .try_into()
        .map_err(|_| GitHubError::deserialization("Public key is not 32 bytes"))?;

    let sealed = PublicKey::from(key_bytes)
        .seal(&mut OsRng, value.as_bytes())
        .map_err(|e| {
            GitHubError::new(
                GitHubErrorKind::Unknown,
                format!("Failed to seal secret value: {}", e),
            )
        })?;
    Ok(BASE64.encode(sealed))
}
