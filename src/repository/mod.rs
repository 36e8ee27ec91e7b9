// src/repository/mod.rs

//! Chart repositories as sources of version candidates
//!
//! This module provides functionality for:
//! - Listing published chart versions from index-file repositories
//! - Listing chart versions from OCI registries by tag enumeration
//! - Fetching repository data over HTTP with retry support
//! - An explicit set of configured repositories handing out sources

mod client;
mod index;
mod oci;
mod registry;

pub use client::{Auth, RepositoryClient};
pub use index::{ChartVersion, IndexFile, IndexSource};
pub use oci::OciTagSource;
pub use registry::{detect_source_kind, Repository, RepositorySet, SourceProvider};

use crate::error::Result;
use std::collections::HashMap;

/// How a repository publishes its versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A separately published index of versions, newest first
    IndexBased,
    /// OCI registry tags, in no particular order
    TagBased,
}

/// Something that can list the raw versions available for a chart
pub trait VersionCandidateSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Raw version strings in the source's native order
    fn list_candidates(&self, name: &str) -> Result<Vec<String>>;
}

/// In-memory candidates, for callers that already hold a version listing
#[derive(Debug, Clone)]
pub struct StaticSource {
    kind: SourceKind,
    versions: HashMap<String, Vec<String>>,
}

impl StaticSource {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            versions: HashMap::new(),
        }
    }

    /// Add a chart with its versions in native order
    pub fn with_chart<I, S>(mut self, name: &str, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.versions
            .insert(name.to_string(), versions.into_iter().map(Into::into).collect());
        self
    }
}

impl VersionCandidateSource for StaticSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn list_candidates(&self, name: &str) -> Result<Vec<String>> {
        Ok(self.versions.get(name).cloned().unwrap_or_default())
    }
}
