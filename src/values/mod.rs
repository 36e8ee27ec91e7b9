// src/values/mod.rs

//! Decoded chart values documents
//!
//! A values document is a tree of mappings whose leaves are strings or
//! booleans. Anything else a YAML document can carry (numbers, sequences,
//! null) is kept verbatim in [`ConfigValue::Other`] so that a rewritten
//! document encodes back without losing data, but discovery and relocation
//! never look inside it.
//!
//! Mappings are ordered by key, which gives every traversal a stable,
//! lexicographic visiting order.

mod condition;

pub use condition::condition_met;

use crate::error::{Error, Result};
use serde_yaml::Value as YamlValue;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Ordered mapping of keys to values
pub type Mapping = BTreeMap<String, ConfigValue>;

/// One node of a decoded values document
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Bool(bool),
    Mapping(Mapping),
    /// Values outside the string/bool/mapping domain, preserved as decoded
    Other(YamlValue),
}

impl Default for ConfigValue {
    fn default() -> Self {
        ConfigValue::Mapping(Mapping::new())
    }
}

impl ConfigValue {
    /// Decode a YAML document
    ///
    /// An empty document decodes to an empty mapping.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let value: YamlValue = serde_yaml::from_str(s)
            .map_err(|e| Error::ParseError(format!("Invalid values document: {e}")))?;
        match value {
            YamlValue::Null => Ok(ConfigValue::default()),
            other => Ok(Self::from_yaml(other)),
        }
    }

    /// Read and decode a YAML values file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::IoError(format!("Failed to read {}: {e}", path.display()))
        })?;
        debug!("Loaded values file {}", path.display());
        Self::from_yaml_str(&content)
    }

    /// Convert a generic YAML value into the values model
    pub fn from_yaml(value: YamlValue) -> Self {
        match value {
            YamlValue::String(s) => ConfigValue::String(s),
            YamlValue::Bool(b) => ConfigValue::Bool(b),
            YamlValue::Mapping(map) => {
                let mut out = Mapping::new();
                for (k, v) in map {
                    out.insert(key_to_string(k), Self::from_yaml(v));
                }
                ConfigValue::Mapping(out)
            }
            other => ConfigValue::Other(other),
        }
    }

    /// Convert back into a generic YAML value
    pub fn to_yaml(&self) -> YamlValue {
        match self {
            ConfigValue::String(s) => YamlValue::String(s.clone()),
            ConfigValue::Bool(b) => YamlValue::Bool(*b),
            ConfigValue::Mapping(map) => {
                let mut out = serde_yaml::Mapping::new();
                for (k, v) in map {
                    out.insert(YamlValue::String(k.clone()), v.to_yaml());
                }
                YamlValue::Mapping(out)
            }
            ConfigValue::Other(v) => v.clone(),
        }
    }

    /// Encode as a YAML document
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(&self.to_yaml())
            .map_err(|e| Error::ParseError(format!("Failed to encode values: {e}")))
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            ConfigValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            ConfigValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a dotted path such as `image.registry`
    pub fn get_path(&self, path: &str) -> Option<&ConfigValue> {
        let mut current = self;
        for segment in path.split('.') {
            current = current.as_mapping()?.get(segment)?;
        }
        Some(current)
    }
}

fn key_to_string(key: YamlValue) -> String {
    match key {
        YamlValue::String(s) => s,
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn is_null(value: &ConfigValue) -> bool {
    matches!(value, ConfigValue::Other(YamlValue::Null))
}

/// Merge `overrides` on top of `defaults`
///
/// Override leaves win, mappings merge key by key, and a `null` override
/// removes the key from the result.
pub fn coalesce(defaults: &ConfigValue, overrides: &ConfigValue) -> ConfigValue {
    match (defaults, overrides) {
        (ConfigValue::Mapping(base), ConfigValue::Mapping(top)) => {
            let mut merged = base.clone();
            for (key, value) in top {
                if is_null(value) {
                    merged.remove(key);
                    continue;
                }
                let next = match merged.get(key) {
                    Some(existing @ ConfigValue::Mapping(_)) => {
                        if value.as_mapping().is_none() {
                            debug!("Override replaces table '{}' with a scalar", key);
                        }
                        coalesce(existing, value)
                    }
                    _ => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            ConfigValue::Mapping(merged)
        }
        (_, top) if is_null(top) => defaults.clone(),
        (_, top) => top.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_domain_and_other_values() {
        let v = ConfigValue::from_yaml_str(
            "image:\n  registry: docker.io\n  pullPolicy: Always\n  useDigest: true\nreplicaCount: 2\nargs: [a, b]\n",
        )
        .unwrap();

        assert_eq!(
            v.get_path("image.registry"),
            Some(&ConfigValue::String("docker.io".to_string()))
        );
        assert_eq!(v.get_path("image.useDigest"), Some(&ConfigValue::Bool(true)));
        assert!(matches!(v.get_path("replicaCount"), Some(ConfigValue::Other(_))));
        assert!(matches!(v.get_path("args"), Some(ConfigValue::Other(_))));
        assert!(v.get_path("image.missing").is_none());
    }

    #[test]
    fn test_empty_document_is_empty_mapping() {
        let v = ConfigValue::from_yaml_str("").unwrap();
        assert_eq!(v, ConfigValue::Mapping(Mapping::new()));
    }

    #[test]
    fn test_invalid_document() {
        assert!(matches!(
            ConfigValue::from_yaml_str("a: [unclosed"),
            Err(Error::ParseError(_))
        ));
    }

    #[test]
    fn test_encode_preserves_other_values() {
        let source = "count: 3\nimage:\n  tag: '1.0'\nlist:\n- x\n";
        let v = ConfigValue::from_yaml_str(source).unwrap();
        let encoded = v.to_yaml_string().unwrap();
        let again = ConfigValue::from_yaml_str(&encoded).unwrap();
        assert_eq!(v, again);
        assert!(encoded.contains("count: 3"));
    }

    #[test]
    fn test_coalesce_overrides_win() {
        let defaults = ConfigValue::from_yaml_str(
            "image:\n  repository: nginx\n  tag: '1.0'\nservice:\n  port: 80\n",
        )
        .unwrap();
        let overrides = ConfigValue::from_yaml_str("image:\n  tag: '2.0'\n").unwrap();

        let merged = coalesce(&defaults, &overrides);
        assert_eq!(merged.get_path("image.tag").and_then(|v| v.as_str()), Some("2.0"));
        assert_eq!(
            merged.get_path("image.repository").and_then(|v| v.as_str()),
            Some("nginx")
        );
        assert!(merged.get_path("service.port").is_some());
    }

    #[test]
    fn test_coalesce_null_removes_key() {
        let defaults = ConfigValue::from_yaml_str("a: x\nb: y\n").unwrap();
        let overrides = ConfigValue::from_yaml_str("a: null\n").unwrap();

        let merged = coalesce(&defaults, &overrides);
        assert!(merged.get_path("a").is_none());
        assert!(merged.get_path("b").is_some());
    }
}
