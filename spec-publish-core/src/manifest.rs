//! The `versions.json` manifest the docs viewer reads to build its version
//! dropdown, and the fetch → merge → write cycle that keeps it current.
//!
//! A fetched manifest is only ever extended. Entries other than the current
//! version and `"stable"` are carried over untouched, in their original
//! order and with any extra fields they may have.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, error, info};

use crate::contract::ManifestFetcher;
use crate::error::PublishError;

pub const STABLE_LABEL: &str = "stable";

/// One manifest record: which spec file and which source label a version maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub spec: String,
    pub source: String,
}

impl ManifestEntry {
    pub fn for_version(version: &str) -> Self {
        Self {
            spec: version.to_string(),
            source: version.to_string(),
        }
    }
}

/// Version label → entry, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionManifest {
    entries: Map<String, Value>,
}

impl VersionManifest {
    pub fn parse(body: &str) -> Result<Self, PublishError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| PublishError::ManifestParse(format!("not valid JSON: {e}")))?;
        let Value::Object(entries) = value else {
            return Err(PublishError::ManifestParse(
                "expected a JSON object of version entries".to_string(),
            ));
        };
        if let Some((label, _)) = entries.iter().find(|(_, v)| !v.is_object()) {
            return Err(PublishError::ManifestParse(format!(
                "entry {label:?} is not an object"
            )));
        }
        Ok(Self { entries })
    }

    /// Point both `version` and `"stable"` at `version`. Existing keys keep
    /// their position; a new version label is appended.
    pub fn upsert_release(&mut self, version: &str) {
        let entry = serde_json::json!({ "spec": version, "source": version });
        self.entries.insert(version.to_string(), entry.clone());
        self.entries.insert(STABLE_LABEL.to_string(), entry);
    }

    pub fn get(&self, label: &str) -> Option<ManifestEntry> {
        self.entries
            .get(label)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialise with one-space indentation, matching what is already on the
    /// publish branch so diffs stay small.
    pub fn to_json(&self) -> io::Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.entries.serialize(&mut ser)?;
        String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn write_to(&self, path: &Path) -> Result<(), PublishError> {
        let json = self.to_json().map_err(|e| {
            error!(error = ?e, path = %path.display(), "Failed to serialise manifest");
            PublishError::staging(path, e)
        })?;
        fs::write(path, json).map_err(|e| {
            error!(error = ?e, path = %path.display(), "Failed to write manifest");
            PublishError::staging(path, e)
        })?;
        info!(path = %path.display(), entries = self.len(), "Wrote manifest");
        Ok(())
    }
}

/// Fetch the published manifest, add `version` as the new stable release and
/// write the result to `dest`. Nothing is written if any step fails.
pub async fn sync_manifest<F>(
    fetcher: &F,
    url: &str,
    version: &str,
    dest: &Path,
) -> Result<VersionManifest, PublishError>
where
    F: ManifestFetcher + ?Sized,
{
    info!(url = %url, "Fetching published manifest");
    let body = fetcher.fetch(url).await?;

    let mut manifest = VersionManifest::parse(&body).map_err(|e| {
        error!(error = %e, url = %url, "Published manifest is malformed");
        e
    })?;
    debug!(labels = ?manifest.labels().collect::<Vec<_>>(), "Fetched manifest");

    info!(version = %version, "Adding stable and current version entries to manifest");
    manifest.upsert_release(version);
    manifest.write_to(dest)?;
    Ok(manifest)
}

/// [`ManifestFetcher`] over plain HTTP(S).
pub struct HttpManifestFetcher {
    client: reqwest::Client,
}

impl HttpManifestFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpManifestFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ManifestFetcher for HttpManifestFetcher {
    async fn fetch(&self, url: &str) -> Result<String, PublishError> {
        let fetch_error = |reason: String| PublishError::ManifestFetch {
            url: url.to_string(),
            reason,
        };

        let response = self.client.get(url).send().await.map_err(|e| {
            error!(error = ?e, url = %url, "Manifest request failed");
            fetch_error(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, url = %url, "Manifest fetch returned non-success status");
            return Err(fetch_error(format!("fetch failed with status: {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| fetch_error(format!("failed to read body: {e}")))
    }
}
