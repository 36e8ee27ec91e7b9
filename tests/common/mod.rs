// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use helmport::repository::IndexSource;
use helmport::{Repository, Result, SourceKind, SourceProvider, StaticSource, VersionCandidateSource};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const INDEX_URL: &str = "https://charts.example.com/stable";
pub const OCI_URL: &str = "oci://registry.example.com/charts";

/// Create an unpacked chart tree:
///
/// - `charts/web`: images for the app and a sidecar, a redis dependency
///   switched by `redis.enabled`, an embedded `common` dependency
/// - `charts/web/charts/redis`: the redis subchart
/// - `overrides/web.yaml`: user overrides for `web`
///
/// Returns (TempDir, charts dir, overrides file) - keep the TempDir alive
/// to prevent cleanup.
pub fn setup_chart_tree() -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = tempfile::tempdir().unwrap();
    let charts = temp_dir.path().join("charts");

    let web = charts.join("web");
    fs::create_dir_all(&web).unwrap();
    fs::write(
        web.join("Chart.yaml"),
        r#"apiVersion: v2
name: web
version: 1.3.0
dependencies:
  - name: redis
    version: ">=18.0.0"
    repository: oci://registry.example.com/charts
    condition: redis.enabled
  - name: common
    version: 2.x
    repository: file://../common
"#,
    )
    .unwrap();
    fs::write(
        web.join("values.yaml"),
        r#"replicaCount: 1
image:
  registry: docker.io
  repository: library/nginx
  tag: "1.25"
sidecar:
  enabled: false
  image:
    repository: busybox
    tag: "1.36"
redis:
  enabled: false
"#,
    )
    .unwrap();

    let redis = web.join("charts").join("redis");
    fs::create_dir_all(&redis).unwrap();
    fs::write(
        redis.join("values.yaml"),
        r#"image:
  registry: docker.io
  repository: bitnami/redis
  tag: "7.2.0"
"#,
    )
    .unwrap();

    let overrides_dir = temp_dir.path().join("overrides");
    fs::create_dir_all(&overrides_dir).unwrap();
    let overrides = overrides_dir.join("web.yaml");
    fs::write(
        &overrides,
        r#"image:
  tag: "1.26"
redis:
  enabled: true
  image:
    tag: "7.2.4"
"#,
    )
    .unwrap();

    (temp_dir, charts, overrides)
}

/// Write a repository index listing `web` and `nginx`
pub fn write_index(dir: &Path) -> PathBuf {
    let path = dir.join("index.yaml");
    fs::write(
        &path,
        r#"apiVersion: v1
entries:
  web:
    - name: web
      version: 1.2.0
    - name: web
      version: 1.3.0
    - name: web
      version: 2.0.0-beta.1
    - name: web
      version: 1.1.0
  nginx:
    - name: nginx
      version: 15.0.0
"#,
    )
    .unwrap();
    path
}

/// A source provider that never touches the network
///
/// Index-based repositories are served from an index file on disk,
/// tag-based ones from a fixed tag list.
pub struct LocalSources {
    pub index_path: PathBuf,
    pub tags: StaticSource,
}

impl LocalSources {
    pub fn new(index_path: PathBuf) -> Self {
        Self {
            index_path,
            tags: StaticSource::new(SourceKind::TagBased)
                .with_chart("redis", ["17.9.0", "18.0.0", "latest", "18.1.0", "19.0.0-rc.1"]),
        }
    }
}

impl SourceProvider for LocalSources {
    fn source_for(&self, repository: &Repository) -> Result<Box<dyn VersionCandidateSource>> {
        match repository.kind()? {
            SourceKind::IndexBased => Ok(Box::new(IndexSource::load(&self.index_path)?)),
            SourceKind::TagBased => Ok(Box::new(self.tags.clone())),
        }
    }
}
