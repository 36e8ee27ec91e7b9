// src/image/policy.rs

//! Per-chart image exclusion and modify rules

use super::ImageRef;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Matches an image by its rendered reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefMatcher {
    #[serde(rename = "ref")]
    pub reference: String,
}

impl RefMatcher {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }

    /// True when `image` renders to this reference, with or without its tag/digest
    pub fn matches(&self, image: &ImageRef) -> bool {
        self.reference == image.reference() || self.reference == image.name()
    }
}

/// Rewrites matching images before they are imported
///
/// A rule with `from_path` applies to images discovered at that values
/// path and replaces their repository with `to`. A rule with `from`
/// applies to images whose reference starts with `from` and swaps that
/// prefix for `to`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyRule {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default, alias = "fromValuePath")]
    pub from_path: Option<String>,
    pub to: String,
}

impl ModifyRule {
    fn apply(&self, image: &mut ImageRef) -> bool {
        if let Some(path) = &self.from_path {
            if image.discovery_paths.iter().any(|p| p == path) {
                image.repository = self.to.clone();
                return true;
            }
        }

        if let Some(from) = &self.from {
            let reference = image.reference();
            if let Some(rest) = reference.strip_prefix(from.as_str()) {
                let (name, tag, digest) = split_reference(&format!("{}{}", self.to, rest));
                let (registry, repository) = split_name(&name);
                image.registry = registry;
                image.repository = repository;
                if let Some(tag) = tag {
                    image.tag = tag;
                }
                if let Some(digest) = digest {
                    image.digest = digest;
                }
                return true;
            }
        }

        false
    }
}

/// Split a rendered reference into name, tag and digest
///
/// A `:` only starts a tag after the last `/`, so registry ports stay in
/// the name.
fn split_reference(reference: &str) -> (String, Option<String>, Option<String>) {
    let (rest, digest) = match reference.split_once('@') {
        Some((rest, digest)) => (rest, Some(digest.to_string())),
        None => (reference, None),
    };
    let last_segment = rest.rfind('/').map_or(0, |i| i + 1);
    match rest[last_segment..].find(':') {
        Some(pos) => {
            let split = last_segment + pos;
            (rest[..split].to_string(), Some(rest[split + 1..].to_string()), digest)
        }
        None => (rest.to_string(), None, digest),
    }
}

/// Split `host/path` into registry and repository when the first segment
/// looks like a registry host
fn split_name(name: &str) -> (String, String) {
    match name.split_once('/') {
        Some((host, rest))
            if host.contains('.') || host.contains(':') || host == "localhost" =>
        {
            (host.to_string(), rest.to_string())
        }
        _ => (String::new(), name.to_string()),
    }
}

/// Image handling rules attached to a chart
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePolicy {
    /// Images never imported
    #[serde(default)]
    pub exclude: Vec<RefMatcher>,
    /// Images imported but never handed to the scanner
    #[serde(default, alias = "excludeCopacetic")]
    pub exclude_from_scan: Vec<RefMatcher>,
    /// Ordered modify rules
    #[serde(default)]
    pub modify: Vec<ModifyRule>,
}

impl ImagePolicy {
    pub fn is_excluded(&self, image: &ImageRef) -> bool {
        self.exclude.iter().any(|m| m.matches(image))
    }

    pub fn is_excluded_from_scan(&self, image: &ImageRef) -> bool {
        self.exclude_from_scan.iter().any(|m| m.matches(image))
    }

    /// Drop images matching an `exclude` entry
    pub fn retain(&self, images: Vec<ImageRef>) -> Vec<ImageRef> {
        images
            .into_iter()
            .filter(|image| {
                let excluded = self.is_excluded(image);
                if excluded {
                    info!("Excluding image {}", image.reference());
                }
                !excluded
            })
            .collect()
    }

    /// Images that should be handed to the scanner
    pub fn scan_targets(&self, images: Vec<ImageRef>) -> Vec<ImageRef> {
        self.retain(images)
            .into_iter()
            .filter(|image| {
                let skipped = self.is_excluded_from_scan(image);
                if skipped {
                    debug!("Not scanning image {}", image.reference());
                }
                !skipped
            })
            .collect()
    }

    /// Apply modify rules in order
    pub fn apply_modify(&self, images: &mut [ImageRef]) {
        for image in images.iter_mut() {
            for rule in &self.modify {
                let before = image.reference();
                if rule.apply(image) {
                    debug!("Modified image {} -> {}", before, image.reference());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(registry: &str, repository: &str, tag: &str, path: &str) -> ImageRef {
        ImageRef {
            registry: registry.to_string(),
            repository: repository.to_string(),
            tag: tag.to_string(),
            discovery_paths: vec![path.to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_matcher_with_and_without_tag() {
        let i = image("docker.io", "bitnami/nginx", "1.25", "image.tag");
        assert!(RefMatcher::new("docker.io/bitnami/nginx").matches(&i));
        assert!(RefMatcher::new("docker.io/bitnami/nginx:1.25").matches(&i));
        assert!(!RefMatcher::new("docker.io/bitnami/nginx:1.26").matches(&i));
    }

    #[test]
    fn test_retain_and_scan_targets() {
        let policy = ImagePolicy {
            exclude: vec![RefMatcher::new("docker.io/bitnami/os-shell")],
            exclude_from_scan: vec![RefMatcher::new("docker.io/bitnami/exporter")],
            modify: Vec::new(),
        };
        let images = vec![
            image("docker.io", "bitnami/nginx", "1", "a.tag"),
            image("docker.io", "bitnami/os-shell", "1", "b.tag"),
            image("docker.io", "bitnami/exporter", "1", "c.tag"),
        ];

        let kept = policy.retain(images.clone());
        assert_eq!(kept.len(), 2);

        let scanned = policy.scan_targets(images);
        assert_eq!(scanned.len(), 1);
        assert_eq!(scanned[0].repository, "bitnami/nginx");
    }

    #[test]
    fn test_modify_by_prefix() {
        let policy = ImagePolicy {
            modify: vec![ModifyRule {
                from: Some("docker.io/bitnami".to_string()),
                to: "registry.example.com/mirror".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut images = vec![image("docker.io", "bitnami/nginx", "1.25", "image.tag")];
        policy.apply_modify(&mut images);

        assert_eq!(images[0].registry, "registry.example.com");
        assert_eq!(images[0].repository, "mirror/nginx");
        assert_eq!(images[0].reference(), "registry.example.com/mirror/nginx:1.25");
    }

    #[test]
    fn test_modify_by_prefix_with_tag() {
        let policy = ImagePolicy {
            modify: vec![ModifyRule {
                from: Some("docker.io/bitnami/nginx:1.25".to_string()),
                to: "registry.example.com/nginx:1.25-patched".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut images = vec![
            image("docker.io", "bitnami/nginx", "1.25", "image.tag"),
            image("docker.io", "bitnami/nginx", "1.26", "other.tag"),
        ];
        policy.apply_modify(&mut images);

        assert_eq!(images[0].reference(), "registry.example.com/nginx:1.25-patched");
        assert_eq!(images[1].reference(), "docker.io/bitnami/nginx:1.26");
    }

    #[test]
    fn test_split_reference() {
        assert_eq!(
            split_reference("localhost:5000/nginx:1.25"),
            ("localhost:5000/nginx".to_string(), Some("1.25".to_string()), None)
        );
        assert_eq!(
            split_reference("docker.io/nginx@sha256:abc"),
            ("docker.io/nginx".to_string(), None, Some("sha256:abc".to_string()))
        );
        assert_eq!(split_reference("nginx"), ("nginx".to_string(), None, None));
    }

    #[test]
    fn test_modify_by_path() {
        let policy = ImagePolicy {
            modify: vec![ModifyRule {
                from_path: Some("sidecar.image".to_string()),
                to: "library/busybox".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut images = vec![
            image("", "busybox-custom", "", "sidecar.image"),
            image("", "nginx", "", "web.image"),
        ];
        policy.apply_modify(&mut images);

        assert_eq!(images[0].repository, "library/busybox");
        assert_eq!(images[1].repository, "nginx");
    }

    #[test]
    fn test_policy_deserialize() {
        let policy: ImagePolicy = serde_json::from_str(
            r#"{"exclude":[{"ref":"a"}],"excludeCopacetic":[{"ref":"b"}],"modify":[{"fromValuePath":"x.image","to":"y"}]}"#,
        )
        .unwrap();
        assert_eq!(policy.exclude[0].reference, "a");
        assert_eq!(policy.exclude_from_scan[0].reference, "b");
        assert_eq!(policy.modify[0].from_path.as_deref(), Some("x.image"));
    }
}
