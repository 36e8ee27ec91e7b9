// src/packages/arena.rs

//! Storage for the chart tree and the operations that walk it

use super::loader::{Dependency, PackageLoader};
use super::{NodeId, PackageNode};
use crate::error::{Error, Result};
use crate::image::{find_image_references, replace_image_references, ImageRef};
use crate::repository::{Repository, SourceProvider};
use crate::resolver::VersionResolver;
use crate::values::{coalesce, condition_met, ConfigValue};
use crate::version::VersionRange;
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// One concrete version selected for a chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub id: NodeId,
    pub name: String,
    pub version: String,
}

/// Owns every chart node of a run
#[derive(Debug, Clone, Default)]
pub struct PackageArena {
    nodes: Vec<PackageNode>,
}

impl PackageArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level chart
    pub fn add_root(&mut self, mut node: PackageNode) -> NodeId {
        node.parent = None;
        self.push(node)
    }

    /// Add a chart declared as a dependency of `parent`
    ///
    /// Repository access, override file and plain-HTTP flag are copied from
    /// the parent when the child is created; later changes to the parent are
    /// not seen by the child.
    pub fn add_dependency(&mut self, parent: NodeId, dependency: &Dependency) -> Result<NodeId> {
        let parent_node = self.try_get(parent)?;
        let repository = Repository {
            name: format!("{}/{}", parent_node.repository.name, dependency.name),
            url: dependency.repository.clone(),
            plain_http: parent_node.repository.plain_http,
            username: None,
            password: None,
        };

        let node = PackageNode {
            name: dependency.name.clone(),
            version: dependency.version.clone(),
            repository,
            values_path: parent_node.values_path.clone(),
            images: parent_node.images.clone(),
            parent: Some(parent),
        };
        debug!("Adding dependency {} of {}", node, parent_node);
        Ok(self.push(node))
    }

    fn push(&mut self, node: PackageNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&PackageNode> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut PackageNode> {
        self.nodes.get_mut(id.0)
    }

    fn try_get(&self, id: NodeId) -> Result<&PackageNode> {
        self.get(id)
            .ok_or_else(|| Error::NotFoundError(format!("No package node {id}")))
    }

    /// Parent of `id`, if it was added as a dependency
    pub fn parent(&self, id: NodeId) -> Option<&PackageNode> {
        self.get(id)?.parent.and_then(|p| self.get(p))
    }

    /// Ids of the top-level charts, in insertion order
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(id, _)| id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &PackageNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Effective values of a chart: its defaults with overrides applied
    ///
    /// The overrides of a top-level chart come from its values file, when
    /// that file exists. A dependency is overridden by the section of its
    /// parent's effective values named after it. Nothing is cached, so
    /// every call reflects the current files.
    pub fn values(&self, id: NodeId, loader: &dyn PackageLoader) -> Result<ConfigValue> {
        let node = self.try_get(id)?;
        let loaded = loader.load(node, self.parent(id))?;
        let overrides = self.overrides(id, node, loader)?;
        Ok(coalesce(&loaded.values, &overrides))
    }

    fn overrides(&self, id: NodeId, node: &PackageNode, loader: &dyn PackageLoader) -> Result<ConfigValue> {
        if let Some(parent) = node.parent {
            let parent_values = self.values(parent, loader)?;
            return Ok(parent_values
                .as_mapping()
                .and_then(|m| m.get(&node.name))
                .cloned()
                .unwrap_or_default());
        }

        match &node.values_path {
            Some(path) if path.exists() => ConfigValue::load(path),
            Some(path) => {
                debug!("No values file at {} for {}", path.display(), id);
                Ok(ConfigValue::default())
            }
            None => Ok(ConfigValue::default()),
        }
    }

    /// Images referenced by a chart, after its exclude and modify rules
    ///
    /// Fields are read from the chart defaults, with the effective values
    /// supplying string overrides and `enabled` switches, so a section a
    /// values file switches on is reported too.
    pub fn images(&self, id: NodeId, loader: &dyn PackageLoader, use_overrides: bool) -> Result<Vec<ImageRef>> {
        let node = self.try_get(id)?;
        let defaults = loader.load(node, self.parent(id))?.values;
        let effective = self.values(id, loader)?;

        let found = find_image_references(&defaults, Some(&effective), use_overrides);
        let mut images = node.images.retain(found);
        node.images.apply_modify(&mut images);
        info!("Found {} images in {}", images.len(), node);
        Ok(images)
    }

    /// Default values of a chart with image references moved to `registry`
    pub fn relocate(&self, id: NodeId, loader: &dyn PackageLoader, registry: &str) -> Result<ConfigValue> {
        let node = self.try_get(id)?;
        let mut values = loader.load(node, self.parent(id))?.values;
        replace_image_references(&mut values, registry);
        Ok(values)
    }

    /// Add the enabled, externally hosted dependencies of a chart
    ///
    /// A dependency with a `condition` is added only when the condition
    /// holds in the chart's effective values. Dependencies embedded in the
    /// chart itself are left alone.
    pub fn discover_dependencies(&mut self, id: NodeId, loader: &dyn PackageLoader) -> Result<Vec<NodeId>> {
        let node = self.try_get(id)?;
        let loaded = loader.load(node, self.parent(id))?;
        let values = self.values(id, loader)?;

        let mut added = Vec::new();
        for dependency in &loaded.dependencies {
            if dependency.is_embedded() {
                debug!("Leaving embedded chart {} as is", dependency.name);
                continue;
            }
            if let Some(condition) = &dependency.condition {
                if !condition_met(condition, &values) {
                    debug!("Dependency {} disabled by '{}'", dependency.name, condition);
                    continue;
                }
            }
            added.push(self.add_dependency(id, dependency)?);
        }
        Ok(added)
    }

    /// The concrete version a chart's expression selects
    ///
    /// An expression that is not a range is taken as an exact version and
    /// returned unchanged, without contacting the repository.
    pub fn resolve_version(&self, id: NodeId, sources: &dyn SourceProvider) -> Result<String> {
        let node = self.try_get(id)?;
        if VersionRange::parse(&node.version.replace('*', "x")).is_err() {
            debug!("Treating '{}' of {} as an exact version", node.version, node.name);
            return Ok(node.version.clone());
        }

        let source = sources.source_for(&node.repository)?;
        VersionResolver::new(source.as_ref()).resolve_best(&node.name, &node.version)
    }

    fn expand_node(&self, id: NodeId, sources: &dyn SourceProvider) -> Result<Vec<ResolvedPackage>> {
        let node = self.try_get(id)?;
        let versions = if VersionRange::parse(&node.version).is_err() {
            vec![self.resolve_version(id, sources)?]
        } else {
            let source = sources.source_for(&node.repository)?;
            VersionResolver::new(source.as_ref()).resolve_all(&node.name, &node.version)?
        };
        if versions.is_empty() {
            warn!("No versions of {} match '{}'", node.name, node.version);
        }

        Ok(versions
            .into_iter()
            .map(|version| ResolvedPackage {
                id,
                name: node.name.clone(),
                version,
            })
            .collect())
    }

    /// Every concrete version selected by the top-level charts
    ///
    /// Charts are resolved concurrently, at most `parallelism` at a time.
    /// The result lists charts in insertion order, each chart's versions in
    /// the order the resolver produced them.
    pub fn expand_versions(&self, sources: &dyn SourceProvider, parallelism: usize) -> Result<Vec<ResolvedPackage>> {
        let roots: Vec<NodeId> = self.roots().collect();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(parallelism.max(1))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to start worker pool: {e}")))?;

        let results: Vec<Result<Vec<ResolvedPackage>>> = pool.install(|| {
            roots
                .par_iter()
                .map(|&id| self.expand_node(id, sources))
                .collect()
        });

        let mut expanded = Vec::new();
        for result in results {
            expanded.extend(result?);
        }
        info!("Expanded {} charts to {} versions", roots.len(), expanded.len());
        Ok(expanded)
    }

    /// Replace a chart's version expression with the newest published version
    pub fn refresh_latest(&mut self, id: NodeId, sources: &dyn SourceProvider) -> Result<String> {
        let node = self.try_get(id)?;
        let source = sources.source_for(&node.repository)?;
        let latest = VersionResolver::new(source.as_ref()).resolve_latest(&node.name)?;
        if latest != node.version {
            info!("Updating {} from {} to {}", node.name, node.version, latest);
        }

        let node = self
            .get_mut(id)
            .ok_or_else(|| Error::NotFoundError(format!("No package node {id}")))?;
        node.version = latest.clone();
        Ok(latest)
    }
}
