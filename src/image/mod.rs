// src/image/mod.rs

//! Container image references found in chart values
//!
//! This module provides:
//! - Discovery of image fields (`registry`, `repository`/`image`, `tag`,
//!   `digest`/`sha`, `useDigest`) in a values tree
//! - Relocation of those fields to a new registry
//! - Exclusion and modify rules applied to discovered images
//! - Handing the remaining images to a vulnerability scanner

mod extract;
mod policy;
mod rewrite;
mod scan;

pub use extract::find_image_references;
pub use policy::{ImagePolicy, ModifyRule, RefMatcher};
pub use rewrite::{normalize_registry, replace_image_references};
pub use scan::{scan_images, ImageScanner};

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// An image location discovered in a values tree
///
/// Two references are the same entity only when they were discovered at
/// the same set of paths; equal field content from different subtrees
/// stays distinct.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImageRef {
    pub registry: String,
    pub repository: String,
    pub tag: String,
    pub digest: String,
    pub use_digest: bool,
    /// Dotted paths of the fields this reference was assembled from
    pub discovery_paths: Vec<String>,
}

impl ImageRef {
    /// Registry and repository joined, without tag or digest
    pub fn name(&self) -> String {
        if self.registry.is_empty() {
            self.repository.clone()
        } else if self.repository.is_empty() {
            self.registry.clone()
        } else {
            format!("{}/{}", self.registry, self.repository)
        }
    }

    /// Full reference, e.g. `docker.io/nginx:1.25` or `docker.io/nginx@sha256:...`
    pub fn reference(&self) -> String {
        let name = self.name();
        if !self.digest.is_empty() && (self.use_digest || self.tag.is_empty()) {
            format!("{}@{}", name, self.digest)
        } else if !self.tag.is_empty() {
            format!("{}:{}", name, self.tag)
        } else {
            name
        }
    }

    fn path_set(&self) -> BTreeSet<&str> {
        self.discovery_paths.iter().map(String::as_str).collect()
    }
}

impl PartialEq for ImageRef {
    fn eq(&self, other: &Self) -> bool {
        self.path_set() == other.path_set()
    }
}

impl Eq for ImageRef {}

impl Hash for ImageRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path_set().hash(state);
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reference())
    }
}
