// src/packages/loader.rs

//! Loading chart contents
//!
//! Downloading and unpacking charts is left to the caller; a loader only
//! has to hand back the decoded default values and the declared
//! dependencies of a chart it can already reach.

use super::{PackageArena, PackageNode};
use crate::error::{Error, Result};
use crate::values::ConfigValue;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A dependency declared in a chart's metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub repository: String,
    /// Dotted values path that switches the dependency on
    #[serde(default)]
    pub condition: Option<String>,
}

impl Dependency {
    /// Dependencies shipped inside the parent chart
    pub fn is_embedded(&self) -> bool {
        self.repository.is_empty() || self.repository.starts_with("file://")
    }
}

/// What a loader knows about one chart
#[derive(Debug, Clone, Default)]
pub struct LoadedPackage {
    /// Location of the unpacked chart
    pub path: PathBuf,
    /// The chart's own default values
    pub values: ConfigValue,
    pub dependencies: Vec<Dependency>,
}

/// Source of chart contents
pub trait PackageLoader {
    /// Load `node`; `parent` is set for charts pulled in as dependencies
    fn load(&self, node: &PackageNode, parent: Option<&PackageNode>) -> Result<LoadedPackage>;
}

#[derive(Debug, Deserialize)]
struct ChartMetadata {
    #[serde(default)]
    dependencies: Vec<Dependency>,
}

/// Loads unpacked charts from a directory
///
/// A chart named `nginx` is read from `<root>/nginx`; a dependency that is
/// not found there is looked up in its parent's `charts/` directory.
#[derive(Debug, Clone)]
pub struct ChartDirLoader {
    root: PathBuf,
}

impl ChartDirLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn locate(&self, node: &PackageNode, parent: Option<&PackageNode>) -> Result<PathBuf> {
        let direct = self.root.join(&node.name);
        if direct.is_dir() {
            return Ok(direct);
        }
        if let Some(parent) = parent {
            let nested = self.root.join(&parent.name).join("charts").join(&node.name);
            if nested.is_dir() {
                return Ok(nested);
            }
        }
        Err(Error::NotFoundError(format!(
            "Chart '{}' not found under {}",
            node.name,
            self.root.display()
        )))
    }

    /// Point the images of every chart in `arena` at `registry`, writing
    /// each chart's `values.yaml` in place
    ///
    /// Returns the rewritten chart directories, in node order.
    pub fn relocate_charts(&self, arena: &PackageArena, registry: &str) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(arena.len());
        for (id, node) in arena.iter() {
            let dir = self.locate(node, arena.parent(id))?;
            let values = arena.relocate(id, self, registry)?;
            self.save_values(&dir, &values)?;
            info!("Relocated images of {} to {}", node.name, registry);
            written.push(dir);
        }
        Ok(written)
    }

    /// Write a values tree back to a chart's `values.yaml`
    pub fn save_values(&self, chart_dir: &Path, values: &ConfigValue) -> Result<()> {
        let path = chart_dir.join("values.yaml");
        fs::write(&path, values.to_yaml_string()?).map_err(|e| {
            Error::IoError(format!("Failed to write {}: {e}", path.display()))
        })?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

impl PackageLoader for ChartDirLoader {
    fn load(&self, node: &PackageNode, parent: Option<&PackageNode>) -> Result<LoadedPackage> {
        let path = self.locate(node, parent)?;

        let values_file = path.join("values.yaml");
        let values = if values_file.exists() {
            ConfigValue::load(&values_file)?
        } else {
            ConfigValue::default()
        };

        let chart_file = path.join("Chart.yaml");
        let dependencies = if chart_file.exists() {
            let content = fs::read_to_string(&chart_file)?;
            let metadata: ChartMetadata = serde_yaml::from_str(&content).map_err(|e| {
                Error::ParseError(format!("Invalid {}: {e}", chart_file.display()))
            })?;
            metadata.dependencies
        } else {
            Vec::new()
        };

        debug!(
            "Loaded chart {} from {} ({} dependencies)",
            node.name,
            path.display(),
            dependencies.len()
        );
        Ok(LoadedPackage {
            path,
            values,
            dependencies,
        })
    }
}
