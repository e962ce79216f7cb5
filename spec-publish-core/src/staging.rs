//! Staging directory handling: wipe, copy the spec in under its published
//! names, and list what ended up there.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::error::PublishError;
use crate::spec::{SpecDescriptor, SpecSource};

/// Refuse a staging dir that is, contains, or sits inside the spec path.
/// Wiping it would delete the spec, or staging would copy into its own source.
pub fn check_staging_dir(dist_dir: &Path, spec_path: &Path) -> Result<(), PublishError> {
    let dist = resolve(dist_dir);
    let spec = resolve(spec_path);
    if spec.starts_with(&dist) || dist.starts_with(&spec) {
        error!(dist_dir = %dist.display(), spec_path = %spec.display(), "Staging dir overlaps spec path");
        return Err(PublishError::Config(format!(
            "staging dir {} overlaps spec path {}",
            dist_dir.display(),
            spec_path.display()
        )));
    }
    Ok(())
}

/// Absolute `path` with its longest existing prefix canonicalised.
fn resolve(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut existing = absolute.as_path();
    let mut rest = Vec::new();
    loop {
        if let Ok(canonical) = fs::canonicalize(existing) {
            return rest.iter().rev().fold(canonical, |acc, name| acc.join(name));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return absolute,
        }
    }
}

/// Leave `dir` existing and empty, whatever was there before.
pub fn prepare_staging_dir(dir: &Path) -> Result<(), PublishError> {
    if dir.exists() {
        if let Err(e) = fs::remove_dir_all(dir) {
            error!(error = ?e, path = %dir.display(), "Failed to remove existing staging dir");
            return Err(PublishError::staging(dir, e));
        }
        debug!(path = %dir.display(), "Removed existing staging dir");
    }
    fs::create_dir_all(dir).map_err(|e| {
        error!(error = ?e, path = %dir.display(), "Failed to create staging dir");
        PublishError::staging(dir, e)
    })?;
    info!(path = %dir.display(), "Prepared clean staging dir");
    Ok(())
}

/// Copy the spec to its "latest" name and, for releases only, to its
/// versioned name. Returns the paths written, latest first.
pub fn stage_spec(descriptor: &SpecDescriptor) -> Result<Vec<PathBuf>, PublishError> {
    let mut targets = vec![descriptor.staging_latest_path.clone()];
    if descriptor.is_release {
        targets.push(descriptor.staging_versioned_path.clone());
    } else {
        info!(version = %descriptor.version, "Pre-release version, staging as latest only");
    }

    for target in &targets {
        info!(
            from = %descriptor.source.path().display(),
            to = %target.display(),
            "Copying spec into staging"
        );
        match &descriptor.source {
            SpecSource::File(src) => copy_file(src, target)?,
            SpecSource::Directory(src) => copy_dir_all(src, target)?,
        }
    }
    Ok(targets)
}

fn copy_file(src: &Path, dst: &Path) -> Result<(), PublishError> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| PublishError::staging(parent, e))?;
    }
    fs::copy(src, dst).map_err(|e| {
        error!(error = ?e, from = %src.display(), to = %dst.display(), "Failed to copy file");
        PublishError::staging(dst, e)
    })?;
    Ok(())
}

/// Recursively copy `src` into `dst`. Existing files are overwritten, nothing
/// already in `dst` is removed. `.git` directories are skipped.
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<(), PublishError> {
    fs::create_dir_all(dst).map_err(|e| PublishError::staging(dst, e))?;
    for entry in fs::read_dir(src).map_err(|e| PublishError::staging(src, e))? {
        let entry = entry.map_err(|e| PublishError::staging(src, e))?;
        let path = entry.path();
        let target = dst.join(entry.file_name());
        if path.is_dir() {
            if entry.file_name() == ".git" {
                debug!(path = %path.display(), "Skipping .git directory");
                continue;
            }
            copy_dir_all(&path, &target)?;
        } else {
            copy_file(&path, &target)?;
        }
    }
    Ok(())
}

/// All files under `dir` as sorted paths relative to `dir`.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>, PublishError> {
    fn visit(dir: &Path, root: &Path, out: &mut Vec<PathBuf>) -> Result<(), PublishError> {
        for entry in fs::read_dir(dir).map_err(|e| PublishError::staging(dir, e))? {
            let path = entry.map_err(|e| PublishError::staging(dir, e))?.path();
            if path.is_dir() {
                visit(&path, root, out)?;
            } else if let Ok(rel) = path.strip_prefix(root) {
                out.push(rel.to_path_buf());
            }
        }
        Ok(())
    }

    let mut files = Vec::new();
    visit(dir, dir, &mut files)?;
    files.sort();
    Ok(files)
}
