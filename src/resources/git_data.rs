//! Git data API payloads used by multi-file pull-request creation.

use serde::{Deserialize, Serialize};

/// Request to create a blob.
#[derive(Debug, Clone, Serialize)]
pub struct CreateBlobRequest {
    /// The content of the blob.
    pub content: String,
    /// The encoding of the content.
    pub encoding: BlobEncoding,
}

/// Blob content encoding.
#[derive(Debug, Clone, Serialize)]
pub enum BlobEncoding {
    /// UTF-8 encoding.
    #[serde(rename = "utf-8")]
    Utf8,
    /// Base64 encoding.
    #[serde(rename = "base64")]
    Base64,
}

/// A reference to a created object carrying only its SHA.
#[derive(Debug, Clone, Deserialize)]
pub struct ShaReference {
    /// The SHA of the object.
    pub sha: String,
}

/// Request to create a tree layered on a base tree.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTreeRequest {
    /// The tree entries to create.
    pub tree: Vec<CreateTreeEntry>,
    /// The SHA of the base tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_tree: Option<String>,
}

/// An entry to create in a tree.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTreeEntry {
    /// The file path.
    pub path: String,
    /// The file mode.
    pub mode: TreeMode,
    /// The type of entry.
    #[serde(rename = "type")]
    pub entry_type: TreeEntryType,
    /// The SHA of the blob.
    pub sha: String,
}

/// Tree entry mode.
#[derive(Debug, Clone, Serialize)]
pub enum TreeMode {
    /// Regular file (100644).
    #[serde(rename = "100644")]
    File,
    /// Executable file (100755).
    #[serde(rename = "100755")]
    Executable,
}

/// Tree entry type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeEntryType {
    /// A blob (file).
    Blob,
}

/// Request to create a commit.
#[derive(Debug, Clone, Serialize)]
pub struct CreateCommitRequest {
    /// The commit message.
    pub message: String,
    /// The SHA of the tree.
    pub tree: String,
    /// The SHAs of the parent commits.
    pub parents: Vec<String>,
}

/// Request to create a reference.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRefRequest {
    /// The reference name (must start with `refs/`).
    #[serde(rename = "ref")]
    pub ref_name: String,
    /// The SHA to point the reference to.
    pub sha: String,
}

/// Request to move a reference to a new commit.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateRefRequest {
    /// The new SHA for the reference.
    pub sha: String,
}

/// A Git reference with the object it points to.
#[derive(Debug, Clone, Deserialize)]
pub struct GitReference {
    /// The object the reference points to.
    pub object: GitObject,
}

/// A Git object.
#[derive(Debug, Clone, Deserialize)]
pub struct GitObject {
    /// The SHA of the object.
    pub sha: String,
}

/// Request to open a pull request.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePullRequestRequest {
    /// Pull request title.
    pub title: String,
    /// Pull request body.
    pub body: String,
    /// Head branch name.
    pub head: String,
    /// Base branch name.
    pub base: String,
}
