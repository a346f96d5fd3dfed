// src/manifest.rs

//! Package manifest payload
//!
//! The manifest carries the installed name, a version and the native
//! libraries the package provides to and requires from the outside world.
//! Library lists are sorted and deduplicated; anything the package provides
//! itself never shows up as a requirement.

use crate::classify::PackageContents;
use crate::config::BuildConfig;
use crate::error::Result;
use crate::package::Package;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Manifest JSON document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub name: String,
    pub version: u64,
    #[serde(default)]
    pub provide_native_libs: Vec<String>,
    #[serde(default)]
    pub require_native_libs: Vec<String>,
}

impl Manifest {
    /// Build the manifest for a classified package
    pub fn for_package(package: &Package, contents: &PackageContents, config: &BuildConfig) -> Self {
        Self::new(
            &package.effective_name,
            package.version.unwrap_or(config.default_manifest_version),
            contents.provides.iter().cloned(),
            contents.requires.iter().cloned(),
        )
    }

    /// Create a manifest, normalizing library lists
    pub fn new(
        name: &str,
        version: u64,
        provides: impl IntoIterator<Item = String>,
        requires: impl IntoIterator<Item = String>,
    ) -> Self {
        let provides: BTreeSet<String> = provides.into_iter().collect();
        let requires: BTreeSet<String> = requires
            .into_iter()
            .filter(|lib| !provides.contains(lib))
            .collect();
        Self {
            name: name.to_string(),
            version,
            provide_native_libs: provides.into_iter().collect(),
            require_native_libs: requires.into_iter().collect(),
        }
    }

    /// Parse a manifest from JSON
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
