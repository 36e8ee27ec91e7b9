// src/config/parser.rs

//! Parser for helmport TOML configuration files.

use crate::error::{Error, Result};
use crate::image::ImagePolicy;
use crate::repository::Repository;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default number of charts resolved at the same time
pub const DEFAULT_PARALLELISM: usize = 4;

/// A complete configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,

    #[serde(default)]
    pub import: ImportConfig,

    /// Repositories charts are taken from
    #[serde(default, rename = "repository")]
    pub repositories: Vec<Repository>,

    /// Charts to process
    #[serde(default, rename = "chart")]
    pub charts: Vec<ChartConfig>,
}

/// The `[settings]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Concurrency limit for version resolution
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    /// Let values files override image fields found in chart defaults
    #[serde(default = "default_true")]
    pub use_overrides: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            parallelism: DEFAULT_PARALLELISM,
            use_overrides: true,
        }
    }
}

fn default_parallelism() -> usize {
    DEFAULT_PARALLELISM
}

fn default_true() -> bool {
    true
}

/// The `[import]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Registry images and charts are relocated to
    #[serde(default)]
    pub registry: Option<String>,
}

/// One `[[chart]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    pub name: String,

    /// Exact version or range expression
    pub version: String,

    /// Name of a configured repository
    pub repository: String,

    /// Overrides for the chart's default values
    #[serde(default)]
    pub values_file: Option<PathBuf>,

    #[serde(default)]
    pub plain_http: bool,

    #[serde(default)]
    pub images: ImagePolicy,
}

impl Config {
    /// Check the configuration for consistency
    pub fn validate(&self) -> Result<()> {
        if self.settings.parallelism == 0 {
            return Err(Error::ConfigError(
                "settings.parallelism must be at least 1".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for repo in &self.repositories {
            if !names.insert(repo.name.as_str()) {
                return Err(Error::ConfigError(format!(
                    "Repository '{}' is defined more than once",
                    repo.name
                )));
            }
            repo.kind()?;
        }

        for chart in &self.charts {
            if chart.version.trim().is_empty() {
                return Err(Error::ConfigError(format!(
                    "Chart '{}' has an empty version",
                    chart.name
                )));
            }
            if !names.contains(chart.repository.as_str()) {
                return Err(Error::ConfigError(format!(
                    "Chart '{}' references unknown repository '{}'",
                    chart.name, chart.repository
                )));
            }
        }

        Ok(())
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| Error::ParseError(format!("Invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Make relative values file paths relative to `base`
    fn anchor_paths(&mut self, base: &Path) {
        for chart in &mut self.charts {
            if let Some(path) = &chart.values_file {
                if path.is_relative() {
                    chart.values_file = Some(base.join(path));
                }
            }
        }
    }
}

/// Parse a configuration file
///
/// Relative `values_file` paths are taken relative to the directory
/// holding the configuration file.
pub fn parse_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::IoError(format!("Failed to read {}: {e}", path.display())))?;
    let mut config = Config::from_toml_str(&content)?;
    if let Some(base) = path.parent() {
        config.anchor_paths(base);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[settings]
parallelism = 2
use_overrides = false

[import]
registry = "oci://registry.example.com/charts"

[[repository]]
name = "bitnami"
url = "https://charts.bitnami.com/bitnami"

[[chart]]
name = "nginx"
version = "^15.0.0"
repository = "bitnami"
values_file = "values/nginx.yaml"
[chart.images]
exclude = [{ ref = "docker.io/bitnami/os-shell" }]
exclude_from_scan = [{ ref = "docker.io/bitnami/nginx-exporter" }]
modify = [{ from = "docker.io/bitnami", to = "registry.example.com/bitnami" }]
"#;

    #[test]
    fn test_parse_config_string() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.settings.parallelism, 2);
        assert!(!config.settings.use_overrides);
        assert_eq!(
            config.import.registry.as_deref(),
            Some("oci://registry.example.com/charts")
        );
        assert_eq!(config.repositories.len(), 1);
        assert_eq!(config.charts.len(), 1);

        let chart = &config.charts[0];
        assert_eq!(chart.version, "^15.0.0");
        assert!(!chart.plain_http);
        assert_eq!(chart.images.exclude.len(), 1);
        assert_eq!(chart.images.modify[0].from.as_deref(), Some("docker.io/bitnami"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.settings.parallelism, DEFAULT_PARALLELISM);
        assert!(config.settings.use_overrides);
        assert!(config.charts.is_empty());
    }

    #[test]
    fn test_unknown_repository() {
        let toml = r#"
[[chart]]
name = "nginx"
version = "1.0.0"
repository = "missing"
"#;
        assert!(matches!(Config::from_toml_str(toml), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_duplicate_repository() {
        let toml = r#"
[[repository]]
name = "a"
url = "https://a.example.com"

[[repository]]
name = "a"
url = "https://b.example.com"
"#;
        assert!(matches!(Config::from_toml_str(toml), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_zero_parallelism() {
        let toml = "[settings]\nparallelism = 0\n";
        assert!(matches!(Config::from_toml_str(toml), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_unsupported_scheme() {
        let toml = "[[repository]]\nname = \"x\"\nurl = \"s3://bucket/charts\"\n";
        assert!(matches!(Config::from_toml_str(toml), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(Config::from_toml_str("[settings"), Err(Error::ParseError(_))));
    }

    #[test]
    fn test_parse_config_file_anchors_values_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", SAMPLE).unwrap();

        let config = parse_config_file(file.path()).unwrap();
        let expected = file.path().parent().unwrap().join("values/nginx.yaml");
        assert_eq!(config.charts[0].values_file, Some(expected));
    }
}
