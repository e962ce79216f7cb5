use std::path::PathBuf;

use thiserror::Error;

/// Every way a publish run can fail. None of these are retried: the caller
/// logs the error and the process exits non-zero.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The spec file (or directory) is missing, unreadable, or has no usable `info.version`.
    #[error("failed to read spec {path}: {reason}")]
    SpecRead { path: PathBuf, reason: String },

    /// Filesystem failure while preparing or filling the staging directory.
    #[error("staging failed at {path}: {source}")]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The remote manifest could not be fetched or answered with a non-success status.
    #[error("failed to fetch manifest from {url}: {reason}")]
    ManifestFetch { url: String, reason: String },

    /// The fetched manifest is not a JSON object of version entries.
    #[error("failed to parse manifest: {0}")]
    ManifestParse(String),

    /// The git handoff failed (auth, network, rejected ref, ...).
    #[error("publish failed during {step}: {reason}")]
    Publish { step: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PublishError {
    pub(crate) fn spec_read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PublishError::SpecRead {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn staging(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PublishError::Staging {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn publish(step: &str, reason: impl ToString) -> Self {
        PublishError::Publish {
            step: step.to_string(),
            reason: reason.to_string(),
        }
    }
}
