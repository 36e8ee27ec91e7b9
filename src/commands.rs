// src/commands.rs
//! Command handlers for the helmport CLI

use anyhow::{Context, Result};
use helmport::config::parse_config_file;
use helmport::image::{normalize_registry, replace_image_references};
use helmport::packages::ChartDirLoader;
use helmport::values::ConfigValue;
use std::fs;
use std::path::Path;
use tracing::info;

/// List the images of every configured chart and its enabled dependencies
///
/// Each chart's version expression is resolved first, so the listing names
/// the chart version whose values were inspected.
pub fn cmd_images(config_path: &Path, charts_dir: &Path, json: bool) -> Result<()> {
    let config = parse_config_file(config_path)?;
    let sources = config.repository_set()?;
    let mut arena = config.package_arena()?;
    let loader = ChartDirLoader::new(charts_dir);

    let roots: Vec<_> = arena.roots().collect();
    for root in roots {
        let added = arena.discover_dependencies(root, &loader)?;
        info!("Chart {} has {} enabled dependencies", root, added.len());
    }

    let mut found = Vec::new();
    for (id, node) in arena.iter() {
        let version = arena
            .resolve_version(id, &sources)
            .with_context(|| format!("Failed to resolve a version of {}", node.name))?;
        let images = arena.images(id, &loader, config.settings.use_overrides)?;
        found.push((node.name.clone(), version, images));
    }

    if json {
        let listing: Vec<_> = found
            .iter()
            .map(|(chart, version, images)| {
                serde_json::json!({
                    "chart": chart,
                    "version": version,
                    "images": images,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    for (chart, version, images) in &found {
        println!("{} {}:", chart, version);
        if images.is_empty() {
            println!("  (no images)");
        }
        for image in images {
            println!("  {}", image.reference());
            for path in &image.discovery_paths {
                println!("    - {}", path);
            }
        }
    }
    Ok(())
}

/// Point the images of every configured chart and its enabled dependencies
/// at another registry, rewriting the unpacked charts' values in place
pub fn cmd_relocate(config_path: &Path, charts_dir: &Path, registry: Option<&str>) -> Result<()> {
    let config = parse_config_file(config_path)?;
    let target = config.relocation_target(registry)?;
    let mut arena = config.package_arena()?;
    let loader = ChartDirLoader::new(charts_dir);

    let roots: Vec<_> = arena.roots().collect();
    for root in roots {
        arena.discover_dependencies(root, &loader)?;
    }

    for dir in loader.relocate_charts(&arena, &target)? {
        println!("Rewrote {}", dir.join("values.yaml").display());
    }
    Ok(())
}

/// Rewrite the image references of a values file
pub fn cmd_rewrite(values_path: &Path, registry: &str, output: Option<&Path>) -> Result<()> {
    let mut values = ConfigValue::load(values_path)
        .with_context(|| format!("Failed to load {}", values_path.display()))?;
    let target = normalize_registry(registry);
    info!("Rewriting images in {} to {}", values_path.display(), target);
    replace_image_references(&mut values, target);

    let rendered = values.to_yaml_string()?;
    match output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

/// Print the versions the configured charts resolve to
pub fn cmd_resolve(config_path: &Path, all: bool, latest: bool) -> Result<()> {
    let config = parse_config_file(config_path)?;
    let sources = config.repository_set()?;
    let mut arena = config.package_arena()?;

    if all {
        for resolved in arena.expand_versions(&sources, config.settings.parallelism)? {
            println!("{} {}", resolved.name, resolved.version);
        }
        return Ok(());
    }

    let roots: Vec<_> = arena.roots().collect();
    for id in roots {
        let version = if latest {
            arena.refresh_latest(id, &sources)?
        } else {
            arena.resolve_version(id, &sources)?
        };
        if let Some(node) = arena.get(id) {
            println!("{} {}", node.name, version);
        }
    }
    Ok(())
}
