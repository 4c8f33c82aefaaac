//! # GitHub Operations Library
//!
//! A GitHub REST API client geared toward organization and repository
//! automation:
//! - Actions variables, secrets and self-hosted runners
//! - Workflow runs, including dispatch-and-correlate to recover the run ID
//! - Commits, file browsing, artifacts, deploy keys
//! - Pull requests, including multi-file creation via the git data API
//! - Org-wide code and issue search
//! - Transparent page-cursor pagination and lazily fetched resource metadata
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use github_ops::{GitHubClient, GitHubConfig, Organization};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GitHubConfig::builder()
//!         .token("ghp_xxxxxxxxxxxx")
//!         .build()?;
//!
//!     let client = GitHubClient::new(config)?;
//!     let org = Organization::new(client, "my-org");
//!
//!     for repo in org.list_repositories().collect_all().await? {
//!         println!("{}", repo["full_name"]);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod errors;

// Authentication
pub mod auth;

// HTTP client and transport
pub mod client;

// Pagination handling
pub mod pagination;

// Lazily fetched resource metadata
pub mod entity;

// Search query encoding
pub mod search;

// Zip archive helpers
pub mod archive;

// Resource facades
pub mod resources;

// Re-exports for convenience
pub use auth::Token;
pub use client::{GitHubClient, GitHubClientBuilder};
pub use config::{GitHubConfig, GitHubConfigBuilder};
pub use entity::Metadata;
pub use errors::{GitHubError, GitHubErrorKind, GitHubResult};
pub use pagination::Paginator;
pub use resources::{Organization, Repository, RunFilter};
pub use search::SearchQuery;
