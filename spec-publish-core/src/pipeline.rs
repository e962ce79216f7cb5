//! High-level pipeline: stage → manifest → publish.
//!
//! This module owns the end-to-end publish workflow for one located spec:
//!   - Refuses a staging directory that overlaps the spec path
//!   - Wipes and recreates the staging directory
//!   - Copies the spec in as "latest", and under its version for releases
//!   - For releases, fetches the published manifest, marks this version as
//!     stable and writes the merged manifest into staging
//!   - Hands the staging directory to a [`Publisher`]
//!
//! # Error Handling
//! Fail-fast: the first failing step returns its [`PublishError`] and nothing
//! after it runs. A failed manifest fetch therefore never reaches the
//! publisher, and never writes a manifest. Whatever was already copied into
//! staging is left behind to be wiped by the next run.
//!
//! # Callable From
//! The CLI crate, and integration tests with mocked collaborators.

use std::path::PathBuf;
use tracing::{error, info};

use crate::config::PublishConfig;
use crate::contract::{ManifestFetcher, Publisher};
use crate::error::PublishError;
use crate::manifest;
use crate::spec::SpecDescriptor;
use crate::staging;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishOptions {
    /// When false, stop after staging (manifest included) and skip the git handoff.
    pub push: bool,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self { push: true }
    }
}

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub version: String,
    pub is_release: bool,
    /// Files in the staging directory, relative to it.
    pub staged_files: Vec<PathBuf>,
    pub manifest_updated: bool,
    pub pushed: bool,
}

pub async fn run_publish<F, P>(
    config: &PublishConfig,
    descriptor: &SpecDescriptor,
    fetcher: &F,
    publisher: &P,
    options: PublishOptions,
) -> Result<PublishReport, PublishError>
where
    F: ManifestFetcher + ?Sized,
    P: Publisher + ?Sized,
{
    info!(version = %descriptor.version, "[PUBLISH] Starting publish of OpenAPI spec");

    staging::check_staging_dir(&config.dist_dir, descriptor.source.path())?;
    staging::prepare_staging_dir(&config.dist_dir)?;
    staging::stage_spec(descriptor)?;

    let mut manifest_updated = false;
    if descriptor.is_release {
        info!(version = %descriptor.version, "[PUBLISH] Release version detected, updating manifest");
        let url = config.manifest_url()?;
        match manifest::sync_manifest(fetcher, &url, &descriptor.version, &config.manifest_path())
            .await
        {
            Ok(m) => {
                info!(entries = m.len(), "[PUBLISH] Manifest updated");
                manifest_updated = true;
            }
            Err(e) => {
                error!(error = %e, "[PUBLISH][ERROR] Manifest update failed, aborting publish");
                return Err(e);
            }
        }
    }

    let staged_files = staging::list_files(&config.dist_dir)?;
    info!(dir = %config.dist_dir.display(), count = staged_files.len(), "[PUBLISH] Staged files:");
    for file in &staged_files {
        info!("  {}", file.display());
    }

    let mut pushed = false;
    if options.push {
        let target = config.publish_target(&descriptor.version);
        if let Err(e) = publisher.publish(&config.dist_dir, &target).await {
            error!(error = %e, branch = %target.branch, "[PUBLISH][ERROR] Publish handoff failed");
            return Err(e);
        }
        pushed = true;
        info!(
            version = %descriptor.version,
            branch = %target.branch,
            user = %target.user.name,
            "[PUBLISH] OpenAPI spec published"
        );
    } else {
        info!("[PUBLISH] Push disabled, leaving staged files in place");
    }

    Ok(PublishReport {
        version: descriptor.version.clone(),
        is_release: descriptor.is_release,
        staged_files,
        manifest_updated,
        pushed,
    })
}
