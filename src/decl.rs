// src/decl.rs

//! Module and package declarations
//!
//! Declarations arrive as a TOML document with one array of tables per module
//! type. Fields are read verbatim; semantic checks happen when the graph is
//! built and during validation.
//!
//! # Example
//!
//! ```toml
//! [[package]]
//! name = "myapex"
//! key = "myapex.key"
//! native_shared_libs = ["mylib"]
//!
//! [[package_key]]
//! name = "myapex.key"
//! public_key = "testkey.avbpubkey"
//! private_key = "testkey.pem"
//!
//! [[native_library]]
//! name = "mylib"
//! shared_libs = ["mylib2", "libfoo#10"]
//! apex_available = ["//apex_available:platform", "myapex"]
//!
//! [native_library.stubs]
//! versions = ["1", "2", "3"]
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_true() -> bool {
    true
}

/// Stub version declaration of a native library
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StubsDecl {
    /// Published interface versions, ascending
    #[serde(default)]
    pub versions: Vec<String>,
}

/// Properties that apply only to the static-link variant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticDecl {
    /// Allow-list for the static variant; the shared list applies when unset
    #[serde(default)]
    pub apex_available: Option<Vec<String>>,
}

/// A native shared library
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NativeLibraryDecl {
    pub name: String,
    #[serde(default)]
    pub shared_libs: Vec<String>,
    #[serde(default)]
    pub runtime_libs: Vec<String>,
    #[serde(default)]
    pub header_libs: Vec<String>,
    #[serde(default)]
    pub static_libs: Vec<String>,
    #[serde(default)]
    pub stubs: StubsDecl,
    #[serde(default)]
    pub apex_available: Vec<String>,
    #[serde(default, rename = "static")]
    pub static_props: StaticDecl,
    #[serde(default)]
    pub vendor_available: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Installed file stem; defaults to the module name
    #[serde(default)]
    pub stem: Option<String>,
    /// Oldest platform API level the module supports
    #[serde(default)]
    pub min_sdk_version: Option<String>,
}

/// A native executable or native test
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BinaryDecl {
    pub name: String,
    #[serde(default)]
    pub shared_libs: Vec<String>,
    #[serde(default)]
    pub runtime_libs: Vec<String>,
    #[serde(default)]
    pub header_libs: Vec<String>,
    #[serde(default)]
    pub static_libs: Vec<String>,
    #[serde(default)]
    pub apex_available: Vec<String>,
    #[serde(default)]
    pub vendor_available: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub stem: Option<String>,
    #[serde(default)]
    pub static_executable: bool,
    /// Oldest platform API level the module supports
    #[serde(default)]
    pub min_sdk_version: Option<String>,
}

/// A Java library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JavaLibraryDecl {
    pub name: String,
    /// Compile-time only Java dependencies
    #[serde(default)]
    pub libs: Vec<String>,
    #[serde(default)]
    pub static_libs: Vec<String>,
    #[serde(default)]
    pub apex_available: Vec<String>,
    #[serde(default = "default_true")]
    pub compile_dex: bool,
    #[serde(default = "default_true")]
    pub installable: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub min_sdk_version: Option<String>,
}

/// A boot classpath fragment grouping Java libraries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootFragmentDecl {
    pub name: String,
    #[serde(default)]
    pub contents: Vec<String>,
    #[serde(default)]
    pub apex_available: Vec<String>,
    #[serde(default = "default_true")]
    pub generate_classpaths_proto: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// A prebuilt file copied into `etc/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrebuiltDecl {
    pub name: String,
    pub src: String,
    #[serde(default)]
    pub sub_dir: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub apex_available: Vec<String>,
    #[serde(default = "default_true")]
    pub installable: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// An embedded application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppDecl {
    pub name: String,
    /// Native libraries loaded through JNI
    #[serde(default)]
    pub jni_libs: Vec<String>,
    #[serde(default)]
    pub apex_available: Vec<String>,
    #[serde(default)]
    pub privileged: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub min_sdk_version: Option<String>,
}

/// A package signing key pair
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageKeyDecl {
    pub name: String,
    /// Path or `:module` reference
    #[serde(default)]
    pub public_key: Option<String>,
    /// Path or `:module` reference
    #[serde(default)]
    pub private_key: Option<String>,
}

/// A container certificate pair sharing a path prefix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateDecl {
    pub name: String,
    pub certificate: String,
}

/// A named group of source files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilegroupDecl {
    pub name: String,
    #[serde(default)]
    pub srcs: Vec<String>,
}

/// A package to assemble
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageDecl {
    pub name: String,
    /// Installed name when it differs from the declaration name
    #[serde(default)]
    pub apex_name: Option<String>,
    pub key: String,
    #[serde(default)]
    pub certificate: Option<String>,
    #[serde(default)]
    pub native_shared_libs: Vec<String>,
    #[serde(default)]
    pub binaries: Vec<String>,
    #[serde(default)]
    pub tests: Vec<String>,
    #[serde(default)]
    pub java_libs: Vec<String>,
    #[serde(default)]
    pub bootclasspath_fragments: Vec<String>,
    #[serde(default)]
    pub prebuilts: Vec<String>,
    #[serde(default)]
    pub apps: Vec<String>,
    #[serde(default)]
    pub use_vendor: bool,
    #[serde(default)]
    pub uses: Vec<String>,
    #[serde(default)]
    pub provide_cpp_shared_libs: bool,
    /// Test-only package
    #[serde(default)]
    pub test: bool,
    #[serde(default)]
    pub compressible: bool,
    #[serde(default)]
    pub updatable: bool,
    #[serde(default)]
    pub min_sdk_version: Option<String>,
    /// Platform version this package instance serves
    #[serde(default)]
    pub vndk_version: Option<String>,
    #[serde(default = "default_true")]
    pub installable: bool,
    /// Package names this package replaces on install
    #[serde(default)]
    pub overrides: Vec<String>,
    /// Manifest version; the configured default applies when unset
    #[serde(default)]
    pub version: Option<u64>,
}

/// The full declaration document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Declarations {
    #[serde(default, rename = "native_library")]
    pub native_libraries: Vec<NativeLibraryDecl>,
    #[serde(default, rename = "binary")]
    pub binaries: Vec<BinaryDecl>,
    #[serde(default, rename = "native_test")]
    pub native_tests: Vec<BinaryDecl>,
    #[serde(default, rename = "java_library")]
    pub java_libraries: Vec<JavaLibraryDecl>,
    #[serde(default, rename = "boot_fragment")]
    pub boot_fragments: Vec<BootFragmentDecl>,
    #[serde(default, rename = "prebuilt")]
    pub prebuilts: Vec<PrebuiltDecl>,
    #[serde(default, rename = "app")]
    pub apps: Vec<AppDecl>,
    #[serde(default, rename = "package_key")]
    pub package_keys: Vec<PackageKeyDecl>,
    #[serde(default, rename = "certificate")]
    pub certificates: Vec<CertificateDecl>,
    #[serde(default, rename = "filegroup")]
    pub filegroups: Vec<FilegroupDecl>,
    #[serde(default, rename = "package")]
    pub packages: Vec<PackageDecl>,
}

impl Declarations {
    /// Parse declarations from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        let decls: Self = toml::from_str(content)?;
        Ok(decls)
    }

    /// Load declarations from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }
}
