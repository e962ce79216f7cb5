//! # contract: the seams between the publish pipeline and the outside world
//!
//! The pipeline talks to exactly two remote systems: the HTTP location of the
//! previously published manifest, and the git repository that receives the
//! staging directory. Both sit behind a trait here so the pipeline can be
//! driven by real clients in the CLI and by `mockall` mocks in tests.
//!
//! ## Mocking & Testing
//! - Both traits are annotated with `automock`; the generated `MockManifestFetcher`
//!   and `MockPublisher` are exported behind the `test-export-mocks` feature so
//!   integration tests in other crates can use them.
//!
//! ## Implementations
//! - [`crate::manifest::HttpManifestFetcher`] for [`ManifestFetcher`]
//! - [`crate::git::GitPublisher`] for [`Publisher`]

use std::path::{Path, PathBuf};

use async_trait::async_trait;
#[allow(unused_imports)]
use mockall::{automock, predicate::*};
use serde::{Deserialize, Serialize};

use crate::error::PublishError;

/// Identity recorded on the publish commit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitUser {
    pub name: String,
    pub email: String,
}

/// Where and how the staging directory is published. Configuration only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    /// Remote to push to. `None` means the `origin` remote of the current directory.
    pub repository_url: Option<String>,
    pub branch: String,
    pub user: CommitUser,
    /// Fully rendered commit message (version already substituted).
    pub commit_message: String,
    pub staging_dir: PathBuf,
}

/// Fetches the raw body of the previously published version manifest.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ManifestFetcher: Send + Sync {
    /// Return the response body. Transport failures and non-success statuses
    /// must be reported as [`PublishError::ManifestFetch`].
    async fn fetch(&self, url: &str) -> Result<String, PublishError>;
}

/// Pushes a prepared staging directory to a publish branch.
///
/// Implementations use "add" semantics: files already on the branch that are
/// not in the staging directory are left alone.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, staging_dir: &Path, target: &PublishTarget) -> Result<(), PublishError>;
}
