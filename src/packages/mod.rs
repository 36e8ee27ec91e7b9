// src/packages/mod.rs

//! Charts and the dependency tree between them
//!
//! Charts pulled in as dependencies keep a link to the chart that declared
//! them, because their effective values come from the parent's values. The
//! tree is stored as an arena: nodes are addressed by [`NodeId`] and a
//! child stores the id of its parent.

mod arena;
mod loader;

pub use arena::{PackageArena, ResolvedPackage};
pub use loader::{ChartDirLoader, Dependency, LoadedPackage, PackageLoader};

use crate::error::Result;
use crate::image::ImagePolicy;
use crate::repository::{Repository, SourceKind};
use std::fmt;
use std::path::PathBuf;

/// Index of a node in a [`PackageArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A chart at a version expression, from a repository
#[derive(Debug, Clone, PartialEq)]
pub struct PackageNode {
    pub name: String,
    /// Version expression: an exact version or a range
    pub version: String,
    pub repository: Repository,
    /// File with user overrides for the chart's values
    pub values_path: Option<PathBuf>,
    pub images: ImagePolicy,
    parent: Option<NodeId>,
}

impl PackageNode {
    pub fn new(name: impl Into<String>, version: impl Into<String>, repository: Repository) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            repository,
            values_path: None,
            images: ImagePolicy::default(),
            parent: None,
        }
    }

    pub fn with_values_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.values_path = Some(path.into());
        self
    }

    pub fn with_images(mut self, images: ImagePolicy) -> Self {
        self.images = images;
        self
    }

    /// Parent node, for charts pulled in as dependencies
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn plain_http(&self) -> bool {
        self.repository.plain_http
    }

    pub fn source_kind(&self) -> Result<SourceKind> {
        self.repository.kind()
    }
}

impl fmt::Display for PackageNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.repository.name, self.name, self.version)
    }
}
