//! Locating the spec and working out which version it is.
//!
//! The version is whatever the document declares in `info.version`, returned
//! byte-for-byte. Release vs pre-release is a plain substring check against a
//! list of markers that the upstream build injects into development versions
//! (`-dev-` infix, `+` build metadata). That is a convention, not semver
//! parsing, and the docs viewer relies on the exact labels.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::config::PublishConfig;
use crate::error::PublishError;

/// What the configured spec path points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecSource {
    File(PathBuf),
    Directory(PathBuf),
}

impl SpecSource {
    pub fn detect(path: &Path) -> Result<Self, PublishError> {
        let meta = fs::metadata(path).map_err(|e| {
            error!(error = ?e, path = %path.display(), "Spec path is not accessible");
            PublishError::spec_read(path, e)
        })?;
        if meta.is_dir() {
            Ok(SpecSource::Directory(path.to_path_buf()))
        } else {
            Ok(SpecSource::File(path.to_path_buf()))
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            SpecSource::File(p) | SpecSource::Directory(p) => p,
        }
    }
}

/// Decides whether a version is a release by looking for pre-release markers.
#[derive(Debug, Clone)]
pub struct ReleaseClassifier {
    markers: Vec<String>,
}

impl ReleaseClassifier {
    pub fn new(markers: Vec<String>) -> Self {
        Self {
            markers: markers.into_iter().filter(|m| !m.is_empty()).collect(),
        }
    }

    pub fn is_release(&self, version: &str) -> bool {
        !self.markers.iter().any(|m| version.contains(m.as_str()))
    }
}

impl Default for ReleaseClassifier {
    fn default() -> Self {
        Self::new(
            crate::config::DEFAULT_PRERELEASE_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        )
    }
}

#[derive(Deserialize)]
struct SpecDocument {
    info: Option<SpecInfo>,
}

#[derive(Deserialize)]
struct SpecInfo {
    version: Option<serde_yaml::Value>,
}

/// Read `info.version` from a YAML (or JSON) spec document.
pub fn read_spec_version(path: &Path) -> Result<String, PublishError> {
    debug!(path = %path.display(), "Reading spec version");
    let content = fs::read_to_string(path).map_err(|e| {
        error!(error = ?e, path = %path.display(), "Failed to read spec file");
        PublishError::spec_read(path, e)
    })?;

    let doc: SpecDocument = serde_yaml::from_str(&content).map_err(|e| {
        error!(error = ?e, path = %path.display(), "Failed to parse spec YAML");
        PublishError::spec_read(path, format!("invalid YAML: {e}"))
    })?;

    let version = doc
        .info
        .and_then(|info| info.version)
        .ok_or_else(|| PublishError::spec_read(path, "missing info.version"))?;

    match version {
        serde_yaml::Value::String(v) if !v.trim().is_empty() => {
            if v.contains('/') || v.contains('\\') || v.contains("..") {
                error!(path = %path.display(), version = %v, "Spec version is not usable as a file name");
                return Err(PublishError::spec_read(
                    path,
                    format!("info.version {v:?} must not contain '/', '\\' or '..'"),
                ));
            }
            info!(path = %path.display(), version = %v, "Found spec version");
            Ok(v)
        }
        serde_yaml::Value::String(_) => Err(PublishError::spec_read(path, "info.version is empty")),
        other => Err(PublishError::spec_read(
            path,
            format!("info.version must be a string, got {other:?}"),
        )),
    }
}

/// The file whose `info.version` stands for a whole spec directory:
/// `version_file` if given, else the first `*.yaml`/`*.yml` in name order.
pub fn version_file_in(dir: &Path, version_file: Option<&Path>) -> Result<PathBuf, PublishError> {
    if let Some(file) = version_file {
        return Ok(dir.join(file));
    }
    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| PublishError::spec_read(dir, e))? {
        let path = entry.map_err(|e| PublishError::spec_read(dir, e))?.path();
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if path.is_file() && is_yaml {
            candidates.push(path);
        }
    }
    candidates.sort();
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| PublishError::spec_read(dir, "no *.yaml or *.yml spec file in directory"))
}

/// Everything derived from the spec for one run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecDescriptor {
    pub source: SpecSource,
    pub version: String,
    pub is_release: bool,
    pub staging_latest_path: PathBuf,
    pub staging_versioned_path: PathBuf,
}

impl SpecDescriptor {
    /// Inspect the configured spec path and derive the staging names for it.
    pub fn locate(config: &PublishConfig) -> Result<Self, PublishError> {
        let source = SpecSource::detect(&config.spec_path)?;
        let classifier = ReleaseClassifier::new(config.prerelease_markers.clone());

        let descriptor = match &source {
            SpecSource::File(path) => {
                let version = read_spec_version(path)?;
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("yaml");
                let prefix = &config.spec_prefix;
                SpecDescriptor {
                    is_release: classifier.is_release(&version),
                    staging_latest_path: config.dist_dir.join(format!("{prefix}-latest.{ext}")),
                    staging_versioned_path: config
                        .dist_dir
                        .join(format!("{prefix}-{version}.{ext}")),
                    version,
                    source: source.clone(),
                }
            }
            SpecSource::Directory(dir) => {
                let version_file = version_file_in(dir, config.spec_version_file.as_deref())?;
                let version = read_spec_version(&version_file)?;
                SpecDescriptor {
                    is_release: classifier.is_release(&version),
                    staging_latest_path: config.dist_dir.join("latest"),
                    staging_versioned_path: config.dist_dir.join(&version),
                    version,
                    source: source.clone(),
                }
            }
        };

        info!(
            version = %descriptor.version,
            is_release = descriptor.is_release,
            source = %descriptor.source.path().display(),
            "Located spec"
        );
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_spec(dir: &Path, name: &str, version_line: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(
            &path,
            format!("openapi: 3.0.1\ninfo:\n  title: Signer\n  {version_line}\npaths: {{}}\n"),
        )
        .unwrap();
        path
    }

    #[test]
    fn markers_mark_pre_releases() {
        let classifier = ReleaseClassifier::default();
        assert!(classifier.is_release("3.2.1"));
        assert!(classifier.is_release("22.1.0-RC1"));
        assert!(!classifier.is_release("3.2.1-dev-5"));
        assert!(!classifier.is_release("22.1.0-dev-abcdef12"));
        assert!(!classifier.is_release("22.1.0+14-g1234abc"));
    }

    #[test]
    fn empty_markers_are_ignored() {
        let classifier = ReleaseClassifier::new(vec![String::new(), "-SNAPSHOT".into()]);
        assert!(classifier.is_release("1.0.0"));
        assert!(!classifier.is_release("1.0.0-SNAPSHOT"));
    }

    #[test]
    fn returns_declared_version_unmodified() {
        let dir = tempdir().unwrap();
        let path = write_spec(dir.path(), "spec.yaml", "version: \"01.4.0-rc.1\"");
        assert_eq!(read_spec_version(&path).unwrap(), "01.4.0-rc.1");
    }

    #[test]
    fn missing_file_is_spec_read_error() {
        let dir = tempdir().unwrap();
        let err = read_spec_version(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, PublishError::SpecRead { .. }));
    }

    #[test]
    fn missing_version_field_is_spec_read_error() {
        let dir = tempdir().unwrap();
        let path = write_spec(dir.path(), "spec.yaml", "description: no version here");
        let err = read_spec_version(&path).unwrap_err();
        assert!(err.to_string().contains("missing info.version"), "{err}");
    }

    #[test]
    fn version_with_path_components_is_rejected() {
        let dir = tempdir().unwrap();
        for version in ["../../escaped", "1.0/evil", "1.0\\\\evil", "1..0"] {
            let path = write_spec(dir.path(), "spec.yaml", &format!("version: \"{version}\""));
            let err = read_spec_version(&path).unwrap_err();
            assert!(matches!(err, PublishError::SpecRead { .. }), "{version}: {err:?}");
        }
    }

    #[test]
    fn numeric_version_is_rejected() {
        let dir = tempdir().unwrap();
        let path = write_spec(dir.path(), "spec.yaml", "version: 1.4");
        let err = read_spec_version(&path).unwrap_err();
        assert!(err.to_string().contains("must be a string"), "{err}");
    }

    #[test]
    fn malformed_yaml_is_spec_read_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("spec.yaml");
        fs::write(&path, "info: [:::").unwrap();
        assert!(matches!(
            read_spec_version(&path).unwrap_err(),
            PublishError::SpecRead { .. }
        ));
    }

    #[test]
    fn file_descriptor_uses_prefix_and_extension() {
        let dir = tempdir().unwrap();
        let spec = write_spec(dir.path(), "web3signer.yml", "version: \"3.2.1\"");
        let config = PublishConfig {
            spec_path: spec.clone(),
            dist_dir: dir.path().join("dist"),
            ..PublishConfig::default()
        };
        let descriptor = SpecDescriptor::locate(&config).unwrap();
        assert_eq!(descriptor.source, SpecSource::File(spec));
        assert!(descriptor.is_release);
        assert_eq!(descriptor.staging_latest_path, dir.path().join("dist/spec-latest.yml"));
        assert_eq!(descriptor.staging_versioned_path, dir.path().join("dist/spec-3.2.1.yml"));
    }

    #[test]
    fn directory_descriptor_reads_first_yaml() {
        let dir = tempdir().unwrap();
        let specs = dir.path().join("specs");
        fs::create_dir_all(&specs).unwrap();
        write_spec(&specs, "b-eth2.yaml", "version: \"9.9.9\"");
        write_spec(&specs, "a-eth1.yaml", "version: \"1.0.0-dev-3\"");
        fs::write(specs.join("README.md"), "not a spec").unwrap();

        let config = PublishConfig {
            spec_path: specs,
            dist_dir: dir.path().join("dist"),
            ..PublishConfig::default()
        };
        let descriptor = SpecDescriptor::locate(&config).unwrap();
        assert_eq!(descriptor.version, "1.0.0-dev-3");
        assert!(!descriptor.is_release);
        assert_eq!(descriptor.staging_latest_path, dir.path().join("dist/latest"));
        assert_eq!(descriptor.staging_versioned_path, dir.path().join("dist/1.0.0-dev-3"));
    }

    #[test]
    fn directory_without_yaml_is_spec_read_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        assert!(matches!(
            version_file_in(dir.path(), None).unwrap_err(),
            PublishError::SpecRead { .. }
        ));
    }
}
