// src/lib.rs

//! helmport
//!
//! Finds the container images a Helm chart references, points them at
//! another registry, and resolves chart version expressions against the
//! versions repositories actually publish.
//!
//! # Architecture
//!
//! - Values trees: decoded YAML with typed scalars and mappings
//! - Image discovery: walks a values tree collecting image references
//! - Relocation: rewrites registry and repository fields in place
//! - Version sources: index files for HTTP repositories, tag listings
//!   for OCI registries
//! - Package tree: charts and their dependencies in an arena, with
//!   values inherited from parent charts

pub mod config;
mod error;
pub mod image;
pub mod packages;
pub mod repository;
pub mod resolver;
pub mod values;
pub mod version;

pub use config::{load_config, parse_config_file, Config, DEFAULT_CONFIG_PATH};
pub use error::{Error, Result};
pub use image::{
    find_image_references, replace_image_references, scan_images, ImagePolicy, ImageRef,
    ImageScanner,
};
pub use packages::{ChartDirLoader, NodeId, PackageArena, PackageLoader, PackageNode};
pub use repository::{
    Repository, RepositorySet, SourceKind, SourceProvider, StaticSource, VersionCandidateSource,
};
pub use resolver::VersionResolver;
pub use values::{coalesce, condition_met, ConfigValue};
pub use version::VersionRange;
