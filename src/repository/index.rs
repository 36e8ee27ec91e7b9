// src/repository/index.rs

//! Chart repository index files
//!
//! An index-based repository publishes an `index.yaml` listing every
//! version of every chart it serves.

use super::client::{Auth, RepositoryClient};
use super::{SourceKind, VersionCandidateSource};
use crate::error::{Error, Result};
use crate::version::parse_tolerant;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// A repository index (`index.yaml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexFile {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub entries: BTreeMap<String, Vec<ChartVersion>>,
    #[serde(default)]
    pub generated: Option<String>,
}

/// One published chart version
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartVersion {
    #[serde(default)]
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub version: String,
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
}

/// Unquoted versions such as `1.0` decode as YAML numbers
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a version string, found {:?}",
            other
        ))),
    }
}

impl IndexFile {
    /// Decode an index document
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        serde_yaml::from_str(s)
            .map_err(|e| Error::ParseError(format!("Invalid repository index: {e}")))
    }

    /// Read an index file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::IoError(format!("Failed to read index {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Order every chart's versions newest first
    ///
    /// Versions that parse are ordered by precedence and come before those
    /// that do not; the rest are ordered by reverse string comparison.
    pub fn sort_entries(&mut self) {
        for versions in self.entries.values_mut() {
            versions.sort_by(|a, b| compare_newest_first(&a.version, &b.version));
        }
    }

    /// Versions of a chart in index order
    pub fn versions(&self, name: &str) -> Vec<String> {
        self.entries
            .get(name)
            .map(|vs| vs.iter().map(|v| v.version.clone()).collect())
            .unwrap_or_default()
    }
}

fn compare_newest_first(a: &str, b: &str) -> Ordering {
    match (parse_tolerant(a), parse_tolerant(b)) {
        (Some(va), Some(vb)) => vb.cmp(&va),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.cmp(a),
    }
}

/// Version candidates from a repository index
#[derive(Debug, Clone)]
pub struct IndexSource {
    index: IndexFile,
}

impl IndexSource {
    /// Use an already decoded index; entries are sorted newest first
    pub fn new(mut index: IndexFile) -> Self {
        index.sort_entries();
        Self { index }
    }

    /// Read the index from a local file
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(IndexFile::load(path)?))
    }

    /// Download `<url>/index.yaml`
    pub fn fetch(client: &RepositoryClient, url: &str, auth: &Auth) -> Result<Self> {
        let index_url = format!("{}/index.yaml", url.trim_end_matches('/'));
        info!("Fetching repository index from {}", index_url);
        let body = client.fetch_text(&index_url, auth)?;
        let index = IndexFile::from_yaml_str(&body)?;
        debug!("Index lists {} charts", index.entries.len());
        Ok(Self::new(index))
    }

    pub fn index(&self) -> &IndexFile {
        &self.index
    }
}

impl VersionCandidateSource for IndexSource {
    fn kind(&self) -> SourceKind {
        SourceKind::IndexBased
    }

    fn list_candidates(&self, name: &str) -> Result<Vec<String>> {
        let versions = self.index.versions(name);
        if versions.is_empty() {
            debug!("Chart '{}' not listed in index", name);
        }
        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"
apiVersion: v1
entries:
  nginx:
    - name: nginx
      version: 1.2.0
      appVersion: "1.25"
      urls: ["https://charts.example.com/nginx-1.2.0.tgz"]
    - name: nginx
      version: 2.0.0-rc.1
    - name: nginx
      version: nightly
    - name: nginx
      version: 1.10.0
    - name: nginx
      version: 1.0
generated: "2024-01-01T00:00:00Z"
"#;

    #[test]
    fn test_decode_index() {
        let index = IndexFile::from_yaml_str(INDEX).unwrap();
        assert_eq!(index.api_version, "v1");
        let nginx = &index.entries["nginx"];
        assert_eq!(nginx.len(), 5);
        assert_eq!(nginx[0].app_version.as_deref(), Some("1.25"));
        assert_eq!(nginx[4].version, "1.0");
    }

    #[test]
    fn test_sort_entries_newest_first() {
        let mut index = IndexFile::from_yaml_str(INDEX).unwrap();
        index.sort_entries();
        assert_eq!(
            index.versions("nginx"),
            vec!["2.0.0-rc.1", "1.10.0", "1.2.0", "1.0", "nightly"]
        );
    }

    #[test]
    fn test_index_source_lists_sorted() {
        let source = IndexSource::new(IndexFile::from_yaml_str(INDEX).unwrap());
        assert_eq!(source.kind(), SourceKind::IndexBased);
        assert_eq!(source.list_candidates("nginx").unwrap()[0], "2.0.0-rc.1");
        assert!(source.list_candidates("redis").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_index() {
        assert!(matches!(
            IndexFile::from_yaml_str("entries: [1, 2"),
            Err(Error::ParseError(_))
        ));
    }
}
