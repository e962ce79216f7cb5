use async_trait::async_trait;
use std::path::Path;
use std::process::Command;
use tracing::{debug, error, info};

use crate::config::redact_url;
use crate::contract::{PublishTarget, Publisher};
use crate::error::PublishError;
use crate::staging::copy_dir_all;

/// Publishes by driving the system `git` binary: check out the branch into a
/// throwaway directory, lay the staging files over it, commit, push.
///
/// Every run starts from a fresh checkout, so no state leaks between runs.
#[derive(Debug, Default)]
pub struct GitPublisher;

impl GitPublisher {
    pub fn new() -> Self {
        Self
    }
}

fn git(dir: Option<&Path>) -> Command {
    let mut cmd = Command::new("git");
    if let Some(dir) = dir {
        cmd.arg("-C").arg(dir);
    }
    cmd.env("GIT_TERMINAL_PROMPT", "0");
    cmd
}

fn run_git(cmd: &mut Command, step: &str) -> Result<String, PublishError> {
    let output = cmd.output().map_err(|e| {
        error!(error = ?e, step = step, "Failed to launch git process");
        PublishError::publish(step, format!("failed to launch git: {e}"))
    })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!(step = step, status = ?output.status, "git exited with non-zero code: {}", stderr.trim());
        return Err(PublishError::publish(step, stderr.trim()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// URL of the `origin` remote of the repository containing `dir`.
pub fn origin_url(dir: &Path) -> Result<String, PublishError> {
    run_git(git(Some(dir)).args(["remote", "get-url", "origin"]), "resolve origin")
}

fn remote_has_branch(repo_url: &str, branch: &str) -> Result<bool, PublishError> {
    let out = run_git(
        git(None).args(["ls-remote", "--heads", repo_url, branch]),
        "ls-remote",
    )?;
    Ok(!out.is_empty())
}

#[async_trait]
impl Publisher for GitPublisher {
    async fn publish(&self, staging_dir: &Path, target: &PublishTarget) -> Result<(), PublishError> {
        let repo_url = match &target.repository_url {
            Some(url) => url.clone(),
            None => origin_url(Path::new("."))?,
        };
        let branch = target.branch.as_str();
        info!(repo_url = %redact_url(&repo_url), branch = branch, "Publishing staging dir");

        let checkout = tempfile::Builder::new()
            .prefix("spec-publish-")
            .tempdir()
            .map_err(|e| PublishError::publish("checkout", e))?;
        let work = checkout.path();

        if remote_has_branch(&repo_url, branch)? {
            run_git(
                git(None)
                    .args(["clone", "--quiet", "--depth", "1", "--single-branch", "--branch", branch])
                    .arg(&repo_url)
                    .arg(work),
                "clone",
            )?;
            debug!(path = %work.display(), "Cloned publish branch");
        } else {
            info!(branch = branch, "Branch does not exist on remote yet, starting it from scratch");
            run_git(git(None).args(["init", "--quiet"]).arg(work), "init")?;
            run_git(
                git(Some(work))
                    .args(["symbolic-ref", "HEAD"])
                    .arg(format!("refs/heads/{branch}")),
                "init",
            )?;
            run_git(
                git(Some(work)).args(["remote", "add", "origin"]).arg(&repo_url),
                "init",
            )?;
        }

        copy_dir_all(staging_dir, work)?;
        run_git(git(Some(work)).args(["add", "--all"]), "add")?;

        // exit 0: nothing staged, 1: changes staged
        let diff = git(Some(work))
            .args(["diff", "--cached", "--quiet"])
            .status()
            .map_err(|e| PublishError::publish("diff", e))?;
        match diff.code() {
            Some(0) => {
                info!(branch = branch, "Publish branch already up to date, nothing to commit");
                return Ok(());
            }
            Some(1) => {}
            _ => return Err(PublishError::publish("diff", format!("git diff exited with {diff}"))),
        }

        run_git(
            git(Some(work))
                .arg("-c")
                .arg(format!("user.name={}", target.user.name))
                .arg("-c")
                .arg(format!("user.email={}", target.user.email))
                .args(["-c", "commit.gpgsign=false"])
                .args(["commit", "--quiet", "-m"])
                .arg(&target.commit_message),
            "commit",
        )?;
        run_git(git(Some(work)).args(["push", "--quiet", "origin", branch]), "push")?;

        info!(
            branch = branch,
            user = %target.user.name,
            message = %target.commit_message,
            "Pushed staging dir to publish branch"
        );
        Ok(())
    }
}
