// src/image/extract.rs

//! Image reference discovery over a values tree

use super::ImageRef;
use crate::values::{ConfigValue, Mapping};

/// Image fields recognised in a values mapping
#[derive(Debug, Clone, Copy)]
enum Field {
    Registry,
    Repository,
    Tag,
    Digest,
}

impl Field {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "registry" => Some(Field::Registry),
            "repository" | "image" => Some(Field::Repository),
            "tag" => Some(Field::Tag),
            "digest" | "sha" => Some(Field::Digest),
            _ => None,
        }
    }

    fn assign(self, image: &mut ImageRef, value: String) {
        match self {
            Field::Registry => image.registry = value,
            Field::Repository => image.repository = value,
            Field::Tag => image.tag = value,
            Field::Digest => image.digest = value,
        }
    }
}

/// Find every image reference in `tree`
///
/// Fields found in the same mapping form one reference; nested mappings
/// contribute their own, separate references. A nested mapping is skipped
/// when its `enabled` switch is off; a switch at the same position in
/// `overrides` takes precedence over the tree's own. With `use_overrides` set, a
/// string at the same position in `overrides` replaces the tree's value.
///
/// Results are ordered depth-first: nested references come before the
/// reference of the mapping that contains them.
pub fn find_image_references(
    tree: &ConfigValue,
    overrides: Option<&ConfigValue>,
    use_overrides: bool,
) -> Vec<ImageRef> {
    match tree.as_mapping() {
        Some(data) => {
            let overrides = overrides.and_then(ConfigValue::as_mapping);
            find_in_mapping(data, overrides, use_overrides, "")
        }
        None => Vec::new(),
    }
}

fn find_in_mapping(
    data: &Mapping,
    overrides: Option<&Mapping>,
    use_overrides: bool,
    prefix: &str,
) -> Vec<ImageRef> {
    let mut found = Vec::new();
    let mut current = ImageRef::default();

    for (key, value) in data {
        let path = join_path(prefix, key);
        match value {
            ConfigValue::Bool(b) => {
                if key == "useDigest" {
                    current.use_digest = *b;
                    current.discovery_paths.push(path);
                }
            }
            ConfigValue::String(s) => {
                let Some(field) = Field::from_key(key) else {
                    continue;
                };
                let effective = match overrides.and_then(|o| o.get(key)) {
                    Some(ConfigValue::String(o)) if use_overrides => o.clone(),
                    _ => s.clone(),
                };
                field.assign(&mut current, effective);
                current.discovery_paths.push(path);
            }
            ConfigValue::Mapping(nested) => {
                let nested_overrides = overrides
                    .and_then(|o| o.get(key))
                    .and_then(ConfigValue::as_mapping);
                let disabled = nested_overrides
                    .and_then(switched_off)
                    .or_else(|| switched_off(nested))
                    .unwrap_or(false);
                if disabled {
                    continue;
                }
                found.extend(find_in_mapping(nested, nested_overrides, use_overrides, &path));
            }
            ConfigValue::Other(_) => {}
        }
    }

    if !current.discovery_paths.is_empty() {
        found.push(current);
    }
    found
}

/// Read a mapping's `enabled` switch
///
/// Only string and bool switches count: a string other than `"true"` or a
/// `false` turns the mapping off. `None` when there is no such switch.
fn switched_off(mapping: &Mapping) -> Option<bool> {
    match mapping.get("enabled") {
        Some(ConfigValue::String(s)) => Some(s != "true"),
        Some(ConfigValue::Bool(b)) => Some(!b),
        _ => None,
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}
