// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: configuration file
fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .value_name("FILE")
        .default_value("helmport.toml")
        .help("Path to the configuration file")
}

fn build_cli() -> Command {
    Command::new("helmport")
        .version(env!("CARGO_PKG_VERSION"))
        .author("helmport contributors")
        .about("Discover, relocate and version-resolve the images of Helm charts")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("images")
                .about("List the images referenced by the configured charts")
                .arg(config_arg())
                .arg(
                    Arg::new("charts")
                        .long("charts")
                        .value_name("DIR")
                        .default_value("charts")
                        .help("Directory holding the unpacked charts"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the references as JSON"),
                ),
        )
        .subcommand(
            Command::new("rewrite")
                .about("Point the image references of a values file at another registry")
                .arg(
                    Arg::new("values")
                        .long("values")
                        .value_name("FILE")
                        .required(true)
                        .help("Values file to rewrite"),
                )
                .arg(
                    Arg::new("registry")
                        .long("registry")
                        .required(true)
                        .help("Target registry, e.g. oci://registry.example.com/charts"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Write the result here instead of standard output"),
                ),
        )
        .subcommand(
            Command::new("relocate")
                .about("Relocate the images of the configured charts in place")
                .arg(config_arg())
                .arg(
                    Arg::new("charts")
                        .long("charts")
                        .value_name("DIR")
                        .default_value("charts")
                        .help("Directory holding the unpacked charts"),
                )
                .arg(
                    Arg::new("registry")
                        .long("registry")
                        .help("Target registry; defaults to registry of the [import] section"),
                ),
        )
        .subcommand(
            Command::new("resolve")
                .about("Resolve the version expressions of the configured charts")
                .arg(config_arg())
                .arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .help("List every matching version instead of the best one"),
                )
                .arg(
                    Arg::new("latest")
                        .long("latest")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("all")
                        .help("Ignore the expressions and report the newest published versions"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = manifest_dir.join("man").join("helmport.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
