// tests/config.rs

//! Loading configuration files and building the chart tree from them.

mod common;

use common::{setup_chart_tree, write_index, LocalSources, INDEX_URL};
use helmport::{parse_config_file, ChartDirLoader, ConfigValue, Error};
use std::fs;

#[test]
fn test_config_drives_resolution() {
    let (temp, charts, _overrides) = setup_chart_tree();
    let sources = LocalSources::new(write_index(temp.path()));
    let config_path = temp.path().join("helmport.toml");
    fs::write(
        &config_path,
        format!(
            r#"
[settings]
parallelism = 2

[[repository]]
name = "stable"
url = "{INDEX_URL}"

[[chart]]
name = "web"
version = "~1.2"
repository = "stable"
values_file = "overrides/web.yaml"

[[chart]]
name = "nginx"
version = "15.0.0"
repository = "stable"
[chart.images]
exclude = [{{ ref = "docker.io/library/nginx" }}]
"#
        ),
    )
    .unwrap();

    let config = parse_config_file(&config_path).unwrap();
    let arena = config.package_arena().unwrap();
    let expanded = arena.expand_versions(&sources, config.settings.parallelism).unwrap();
    let pairs: Vec<(&str, &str)> = expanded
        .iter()
        .map(|r| (r.name.as_str(), r.version.as_str()))
        .collect();
    assert_eq!(pairs, vec![("web", "1.2.0"), ("nginx", "15.0.0")]);

    // the relative values file is found next to the configuration
    let loader = ChartDirLoader::new(&charts);
    let web = arena.roots().next().unwrap();
    let values = arena.values(web, &loader).unwrap();
    assert_eq!(values.get_path("image.tag").and_then(ConfigValue::as_str), Some("1.26"));
}

#[test]
fn test_missing_config_file() {
    let temp = tempfile::tempdir().unwrap();
    let result = parse_config_file(&temp.path().join("missing.toml"));
    assert!(matches!(result, Err(Error::IoError(_))));
}
