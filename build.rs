// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: declarations file
fn decls_arg() -> Arg {
    Arg::new("decls")
        .required(true)
        .value_name("FILE")
        .help("Declarations file")
}

fn build_cli() -> Command {
    Command::new("modpack")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Modpack Contributors")
        .about("Assemble module packages from build declarations")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .default_value("modpack.toml")
                .global(true)
                .help("Build configuration file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::SetTrue)
                .global(true)
                .help("Enable debug logging"),
        )
        .subcommand(
            Command::new("plan")
                .about("Run the full build and print the recipe")
                .arg(decls_arg())
                .arg(
                    Arg::new("format")
                        .short('f')
                        .long("format")
                        .value_parser(["json", "toml"])
                        .default_value("json")
                        .help("Output format"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Validate declarations without assembling packages")
                .arg(decls_arg()),
        )
        .subcommand(
            Command::new("variants")
                .about("List the variants created for every module")
                .arg(decls_arg()),
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

    let man_path = man_dir.join("modpack.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
