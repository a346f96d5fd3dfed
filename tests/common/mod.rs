// tests/common/mod.rs

//! Shared helpers for integration tests.

#![allow(dead_code)]

use modpack::graph::ImageClass;
use modpack::pipeline::Analysis;
use modpack::{Arch, BuildConfig, BuildRecipe, Declarations, Pipeline, Result, VariantKey};
use std::path::PathBuf;
use tempfile::TempDir;

/// Key declaration shared by every test package (`key = "test.key"`)
pub const TEST_KEY: &str = r#"
[[package_key]]
name = "test.key"
public_key = "testkey.avbpubkey"
private_key = "testkey.pem"
"#;

/// Parse declarations with the shared test key appended
pub fn decls(toml: &str) -> Declarations {
    Declarations::parse(&format!("{}\n{}", toml, TEST_KEY)).unwrap()
}

/// Plan with the default configuration
pub fn plan(toml: &str) -> Result<BuildRecipe> {
    plan_with(toml, &BuildConfig::default())
}

pub fn plan_with(toml: &str, config: &BuildConfig) -> Result<BuildRecipe> {
    Pipeline::new(&decls(toml), config).plan()
}

/// Run the analysis passes with the default configuration
pub fn analyze(toml: &str) -> Result<Analysis> {
    Pipeline::new(&decls(toml), &BuildConfig::default()).analyze()
}

/// In-package destinations of a planned package
pub fn dests(recipe: &BuildRecipe, package: &str) -> Vec<String> {
    recipe
        .package(package)
        .unwrap()
        .invocation
        .copy_commands
        .iter()
        .map(|c| c.dest.clone())
        .collect()
}

/// Package-scoped variant key on the default arch
pub fn package_key(package: &str) -> VariantKey {
    VariantKey::in_package(Some(Arch::Arm64), ImageClass::Core, package)
}

/// Platform variant key on the default arch
pub fn platform_key() -> VariantKey {
    VariantKey::platform(Some(Arch::Arm64))
}

/// Write declarations and config into a temp directory
///
/// Returns (TempDir, decls_path, config_path) - keep the TempDir alive.
pub fn write_inputs(toml: &str, config: &str) -> (TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let decls_path = dir.path().join("modules.toml");
    let config_path = dir.path().join("modpack.toml");
    std::fs::write(&decls_path, format!("{}\n{}", toml, TEST_KEY)).unwrap();
    std::fs::write(&config_path, config).unwrap();
    (dir, decls_path, config_path)
}
