// src/image/rewrite.rs

//! Relocation of image references to another registry

use crate::values::ConfigValue;

/// Strip an `oci://` scheme and a trailing `/charts` from a target registry
pub fn normalize_registry(target: &str) -> &str {
    let target = target.strip_prefix("oci://").unwrap_or(target);
    target.strip_suffix("/charts").unwrap_or(target)
}

/// Point every image reference in `tree` at `target`
///
/// `registry` strings are replaced outright. For `image` and `repository`
/// strings the host segment is replaced, or prepended when the value has
/// no host. Every mapping is visited, including ones whose `enabled` flag
/// is off, so that switching them on later still pulls from `target`.
pub fn replace_image_references(tree: &mut ConfigValue, target: &str) {
    let target = normalize_registry(target);
    if let Some(map) = tree.as_mapping_mut() {
        for (key, value) in map.iter_mut() {
            match value {
                ConfigValue::String(s) => match key.as_str() {
                    "registry" => *s = target.to_string(),
                    "image" | "repository" if !s.is_empty() => *s = relocate(s, target),
                    _ => {}
                },
                ConfigValue::Mapping(_) => replace_image_references(value, target),
                ConfigValue::Bool(_) | ConfigValue::Other(_) => {}
            }
        }
    }
}

fn relocate(repository: &str, target: &str) -> String {
    if repository
        .strip_prefix(target)
        .is_some_and(|rest| rest.starts_with('/'))
    {
        return repository.to_string();
    }

    let mut segments: Vec<&str> = repository.split('/').collect();
    if segments.len() > 1 {
        segments[0] = target;
    } else {
        segments.insert(0, target);
    }
    segments.join("/")
}
