// src/config.rs

//! Build configuration
//!
//! Product-level settings that the declarations cannot express: target
//! architectures, the vendor-linkage allow-list, certificate overrides,
//! default signing locations and the boot image layout.
//!
//! # Example modpack.toml
//!
//! ```toml
//! arches = ["arm64", "arm"]
//! use_vendor_allowlist = ["myapex"]
//! compression = true
//!
//! [certificate_overrides]
//! myapex = "myapex.certificate.override"
//!
//! [boot_image]
//! name = "art"
//! modules = ["core-oj", "core-libart"]
//! install_in_package = true
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use strum_macros::{Display, EnumString};
use tracing::debug;

/// Default manifest version written when a package does not set one
pub const DEFAULT_MANIFEST_VERSION: u64 = 1;

/// Target architecture of native variants
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumString,
)]
pub enum Arch {
    #[serde(rename = "arm64")]
    #[strum(serialize = "arm64")]
    Arm64,
    #[serde(rename = "arm")]
    #[strum(serialize = "arm")]
    Arm,
    #[serde(rename = "x86_64")]
    #[strum(serialize = "x86_64")]
    X86_64,
    #[serde(rename = "x86")]
    #[strum(serialize = "x86")]
    X86,
}

impl Arch {
    /// Whether native libraries of this arch install under `lib64/`
    pub fn is_64bit(&self) -> bool {
        matches!(self, Self::Arm64 | Self::X86_64)
    }

    /// Library directory inside a package
    pub fn lib_dir(&self) -> &'static str {
        if self.is_64bit() { "lib64" } else { "lib" }
    }
}

/// Boot image settings shared by every boot fragment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootImageConfig {
    /// Image name (e.g. "art")
    #[serde(default)]
    pub name: String,

    /// Java modules compiled into the image, in classpath order
    #[serde(default)]
    pub modules: Vec<String>,

    /// Whether image files install inside the owning package
    #[serde(default)]
    pub install_in_package: bool,

    /// Ship the boot image profile as `etc/boot-image.prof`
    #[serde(default = "default_true")]
    pub generate_profile: bool,
}

impl Default for BootImageConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            modules: Vec::new(),
            install_in_package: false,
            generate_profile: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Product build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Architectures native modules are built for; the first is primary
    #[serde(default = "default_arches")]
    pub arches: Vec<Arch>,

    /// Packages allowed to enable vendor linkage
    #[serde(default)]
    pub use_vendor_allowlist: Vec<String>,

    /// Container certificate overrides keyed by package name
    #[serde(default)]
    pub certificate_overrides: BTreeMap<String, String>,

    /// Directory that relative key paths resolve under
    #[serde(default = "default_dev_key_dir")]
    pub default_dev_key_dir: String,

    /// Directory that plain certificate names resolve under
    #[serde(default = "default_dev_key_dir")]
    pub default_certificate_dir: String,

    /// Certificate used when a package names none
    #[serde(default = "default_certificate")]
    pub default_certificate: String,

    /// Boot image layout
    #[serde(default)]
    pub boot_image: BootImageConfig,

    /// Allow compressed package output
    #[serde(default)]
    pub compression: bool,

    /// Manifest version for packages that set none
    #[serde(default = "default_manifest_version")]
    pub default_manifest_version: u64,
}

fn default_arches() -> Vec<Arch> {
    vec![Arch::Arm64]
}

fn default_dev_key_dir() -> String {
    "build/make/target/product/security".to_string()
}

fn default_certificate() -> String {
    "testkey".to_string()
}

fn default_manifest_version() -> u64 {
    DEFAULT_MANIFEST_VERSION
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            arches: default_arches(),
            use_vendor_allowlist: Vec::new(),
            certificate_overrides: BTreeMap::new(),
            default_dev_key_dir: default_dev_key_dir(),
            default_certificate_dir: default_dev_key_dir(),
            default_certificate: default_certificate(),
            boot_image: BootImageConfig::default(),
            compression: false,
            default_manifest_version: default_manifest_version(),
        }
    }
}

impl BuildConfig {
    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.arches.is_empty() {
            return Err(Error::ParseError(
                "arches must name at least one architecture".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from a file, falling back to defaults when it does
    /// not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Primary architecture; `validate` guarantees one exists
    pub fn primary_arch(&self) -> Arch {
        self.arches[0]
    }

    /// Whether `package` may enable vendor linkage
    pub fn vendor_allowed(&self, package: &str) -> bool {
        self.use_vendor_allowlist.iter().any(|p| p == package)
    }

    /// Certificate override for `package`, if any
    pub fn certificate_override(&self, package: &str) -> Option<&str> {
        self.certificate_overrides.get(package).map(String::as_str)
    }

    /// Default certificate as a (pem, key) pair
    pub fn default_certificate_pair(&self) -> (String, String) {
        let base = format!("{}/{}", self.default_certificate_dir, self.default_certificate);
        (format!("{}.x509.pem", base), format!("{}.pk8", base))
    }
}
