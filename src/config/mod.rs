// src/config/mod.rs

//! Run configuration
//!
//! A TOML file names the repositories charts come from and the charts to
//! process, with per-chart values overrides and image rules:
//!
//! ```toml
//! [settings]
//! parallelism = 4
//!
//! [[repository]]
//! name = "bitnami"
//! url = "https://charts.bitnami.com/bitnami"
//!
//! [[chart]]
//! name = "nginx"
//! version = "^15.0.0"
//! repository = "bitnami"
//! ```

mod parser;

pub use parser::{
    parse_config_file, ChartConfig, Config, ImportConfig, Settings, DEFAULT_PARALLELISM,
};

use crate::error::{Error, Result};
use crate::packages::{PackageArena, PackageNode};
use crate::repository::{RepositoryClient, RepositorySet};
use std::path::Path;

/// Default path for the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "helmport.toml";

/// Load a configuration from the default or specified path
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    parse_config_file(path)
}

impl Config {
    /// The configured repositories, sharing one HTTP client
    pub fn repository_set(&self) -> Result<RepositorySet> {
        let client = RepositoryClient::new()?;
        RepositorySet::from_repositories(client, self.repositories.iter().cloned())
    }

    /// Registry images are relocated to: `registry` when given, otherwise
    /// the `[import]` section's
    pub fn relocation_target(&self, registry: Option<&str>) -> Result<String> {
        registry
            .map(str::to_string)
            .or_else(|| self.import.registry.clone())
            .ok_or_else(|| {
                Error::ConfigError(
                    "No relocation target: pass --registry or set import.registry".to_string(),
                )
            })
    }

    /// One root node per configured chart, in file order
    pub fn package_arena(&self) -> Result<PackageArena> {
        let mut arena = PackageArena::new();
        for chart in &self.charts {
            let mut repository = self
                .repositories
                .iter()
                .find(|r| r.name == chart.repository)
                .cloned()
                .ok_or_else(|| {
                    Error::ConfigError(format!(
                        "Chart '{}' references unknown repository '{}'",
                        chart.name, chart.repository
                    ))
                })?;
            repository.plain_http |= chart.plain_http;

            let mut node = PackageNode::new(&chart.name, &chart.version, repository)
                .with_images(chart.images.clone());
            if let Some(path) = &chart.values_file {
                node = node.with_values_path(path);
            }
            arena.add_root(node);
        }
        Ok(arena)
    }
}
