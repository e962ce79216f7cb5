/// `load_config` module: builds the immutable [`PublishConfig`] for a run.
///
/// Three layers, later ones winning:
/// 1. built-in defaults ([`PublishConfig::default`])
/// 2. an optional YAML file (every key optional)
/// 3. `OA_*` environment variables, which is how CI normally drives the tool
///
/// Empty environment variables count as unset.
///
/// # Errors
/// All errors use `anyhow::Error` and surface at the CLI boundary.
use anyhow::{Context, Result};
use serde::Deserialize;
use spec_publish_core::config::PublishConfig;
use spec_publish_core::staging::check_staging_dir;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const ENV_SPEC_PATH: &str = "OA_SPEC_PATH";
pub const ENV_SPEC_VERSION_FILE: &str = "OA_SPEC_VERSION_FILE";
pub const ENV_SPEC_PREFIX: &str = "OA_SPEC_PREFIX";
pub const ENV_DIST_DIR: &str = "OA_DIST_DIR";
pub const ENV_MANIFEST_FILE_NAME: &str = "OA_VERSIONS_FILE_NAME";
pub const ENV_MANIFEST_URL: &str = "OA_VERSIONS_URL";
pub const ENV_REPOSITORY_URL: &str = "OA_GIT_URL";
pub const ENV_BRANCH: &str = "OA_GH_PAGES_BRANCH";
pub const ENV_USER_NAME: &str = "OA_GIT_USERNAME";
pub const ENV_USER_EMAIL: &str = "OA_GIT_EMAIL";
pub const ENV_COMMIT_MESSAGE: &str = "OA_COMMIT_MESSAGE";
pub const ENV_PRERELEASE_MARKERS: &str = "OA_PRERELEASE_MARKERS";

pub const ALL_ENV_VARS: [&str; 12] = [
    ENV_SPEC_PATH,
    ENV_SPEC_VERSION_FILE,
    ENV_SPEC_PREFIX,
    ENV_DIST_DIR,
    ENV_MANIFEST_FILE_NAME,
    ENV_MANIFEST_URL,
    ENV_REPOSITORY_URL,
    ENV_BRANCH,
    ENV_USER_NAME,
    ENV_USER_EMAIL,
    ENV_COMMIT_MESSAGE,
    ENV_PRERELEASE_MARKERS,
];

/// The YAML file shape. Anything left out keeps its default.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub spec_path: Option<PathBuf>,
    pub spec_version_file: Option<PathBuf>,
    pub spec_prefix: Option<String>,
    pub dist_dir: Option<PathBuf>,
    pub manifest_file_name: Option<String>,
    pub manifest_url: Option<String>,
    pub repository_url: Option<String>,
    pub branch: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub commit_message: Option<String>,
    pub prerelease_markers: Option<Vec<String>>,
}

impl FileConfig {
    fn apply(self, config: &mut PublishConfig) {
        if let Some(v) = self.spec_path {
            config.spec_path = v;
        }
        if let Some(v) = self.spec_version_file {
            config.spec_version_file = Some(v);
        }
        if let Some(v) = self.spec_prefix {
            config.spec_prefix = v;
        }
        if let Some(v) = self.dist_dir {
            config.dist_dir = v;
        }
        if let Some(v) = self.manifest_file_name {
            config.manifest_file_name = v;
        }
        if let Some(v) = self.manifest_url {
            config.manifest_url = Some(v);
        }
        if let Some(v) = self.repository_url {
            config.repository_url = Some(v);
        }
        if let Some(v) = self.branch {
            config.branch = v;
        }
        if let Some(v) = self.user_name {
            config.user.name = v;
        }
        if let Some(v) = self.user_email {
            config.user.email = v;
        }
        if let Some(v) = self.commit_message {
            config.commit_message = v;
        }
        if let Some(v) = self.prerelease_markers {
            config.prerelease_markers = v;
        }
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    info!(config_path = ?path, "Loading configuration from file");
    let content = fs::read_to_string(path).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to read config file");
        anyhow::anyhow!("Failed to read config file {:?}: {}", path, e)
    })?;
    if content.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    serde_yaml::from_str(&content).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
        anyhow::anyhow!("Failed to parse config YAML: {e}")
    })
}

/// Overlay environment values, looked up through `lookup`.
pub fn apply_env<F>(config: &mut PublishConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get(ENV_SPEC_PATH) {
        config.spec_path = PathBuf::from(v);
    }
    if let Some(v) = get(ENV_SPEC_VERSION_FILE) {
        config.spec_version_file = Some(PathBuf::from(v));
    }
    if let Some(v) = get(ENV_SPEC_PREFIX) {
        config.spec_prefix = v;
    }
    if let Some(v) = get(ENV_DIST_DIR) {
        config.dist_dir = PathBuf::from(v);
    }
    if let Some(v) = get(ENV_MANIFEST_FILE_NAME) {
        config.manifest_file_name = v;
    }
    if let Some(v) = get(ENV_MANIFEST_URL) {
        config.manifest_url = Some(v);
    }
    if let Some(v) = get(ENV_REPOSITORY_URL) {
        config.repository_url = Some(v);
    }
    if let Some(v) = get(ENV_BRANCH) {
        config.branch = v;
    }
    if let Some(v) = get(ENV_USER_NAME) {
        config.user.name = v;
    }
    if let Some(v) = get(ENV_USER_EMAIL) {
        config.user.email = v;
    }
    if let Some(v) = get(ENV_COMMIT_MESSAGE) {
        config.commit_message = v;
    }
    if let Some(v) = get(ENV_PRERELEASE_MARKERS) {
        config.prerelease_markers = v
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();
    }
}

fn validate(config: &PublishConfig) -> Result<()> {
    if config.branch.trim().is_empty() {
        anyhow::bail!("Publish branch must not be empty");
    }
    if config.manifest_file_name.trim().is_empty() {
        anyhow::bail!("Manifest file name must not be empty");
    }
    if config.dist_dir.as_os_str().is_empty() {
        anyhow::bail!("Staging directory must not be empty");
    }
    check_staging_dir(&config.dist_dir, &config.spec_path)?;
    Ok(())
}

/// Defaults, then the YAML file at `path` (if any), then the process environment.
pub fn load_config(path: Option<&Path>) -> Result<PublishConfig> {
    let mut config = PublishConfig::default();
    if let Some(path) = path {
        read_file_config(path)?.apply(&mut config);
    }
    apply_env(&mut config, |key| std::env::var(key).ok());
    validate(&config).context("Invalid publish configuration")?;
    config.trace_loaded();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn env_overrides_defaults() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_BRANCH, "docs"),
            (ENV_PRERELEASE_MARKERS, " -SNAPSHOT , ,+build"),
            (ENV_DIST_DIR, ""),
        ]);
        let mut config = PublishConfig::default();
        apply_env(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.branch, "docs");
        assert_eq!(config.prerelease_markers, vec!["-SNAPSHOT", "+build"]);
        assert_eq!(config.dist_dir, PublishConfig::default().dist_dir);
    }

    #[test]
    fn staging_dir_holding_the_spec_is_rejected() {
        let config = PublishConfig {
            dist_dir: PathBuf::from("build"),
            ..PublishConfig::default()
        };
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("overlaps spec path"), "got {err}");

        let config = PublishConfig {
            dist_dir: PathBuf::from("build/openapi/publish"),
            spec_path: PathBuf::from("build/openapi"),
            ..PublishConfig::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn default_paths_are_valid() {
        validate(&PublishConfig::default()).unwrap();
    }

    #[test]
    fn empty_branch_is_rejected() {
        let config = PublishConfig {
            branch: " ".into(),
            ..PublishConfig::default()
        };
        assert!(validate(&config).is_err());
    }
}
