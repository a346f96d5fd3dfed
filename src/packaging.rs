// src/packaging.rs

//! Packaging-tool invocations and make metadata
//!
//! Turns a classified, validated package into the value the packaging tool
//! would be run with, plus the metadata the make layer installs it by. The
//! tool itself is never executed.

use crate::classify::PackageContents;
use crate::config::BuildConfig;
use crate::error::Result;
use crate::keys::{CertificatePair, KeyPair};
use crate::manifest::Manifest;
use crate::module::FileClass;
use crate::package::Package;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Install directory for packages on the device image
pub const INSTALL_DIR: &str = "system/apex";

/// Extension of an uncompressed package
pub const PACKAGE_SUFFIX: &str = ".apex";

/// Extension of a compressed package
pub const COMPRESSED_SUFFIX: &str = ".capex";

/// One file copy performed while staging the package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyCommand {
    pub source: String,
    pub dest: String,
    pub class: FileClass,
}

/// Everything the packaging tool needs for one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagingInvocation {
    pub package: String,
    pub copy_commands: Vec<CopyCommand>,
    pub manifest_json: String,
    pub public_key: String,
    pub private_key: String,
    pub certificate: String,
    pub certificate_key: String,
    pub compress: bool,
    /// Skip the check that the key is named after the package
    pub no_check_key_name: bool,
    /// SHA-256 over every other field, hex encoded
    pub fingerprint: String,
}

impl PackagingInvocation {
    /// Assemble the invocation for a package
    pub fn build(
        package: &Package,
        contents: &PackageContents,
        manifest: &Manifest,
        keys: &KeyPair,
        certificate: &CertificatePair,
        config: &BuildConfig,
    ) -> Result<Self> {
        let copy_commands = contents
            .files
            .iter()
            .map(|f| CopyCommand {
                source: f.source.clone(),
                dest: f.dest.clone(),
                class: f.class,
            })
            .collect();

        let mut invocation = Self {
            package: package.name.clone(),
            copy_commands,
            manifest_json: manifest.to_json()?,
            public_key: keys.public_key.clone(),
            private_key: keys.private_key.clone(),
            certificate: certificate.pem.clone(),
            certificate_key: certificate.key.clone(),
            compress: should_compress(package, config),
            no_check_key_name: package.effective_name != package.name
                || package.key_name_differs(),
            fingerprint: String::new(),
        };
        invocation.fingerprint = invocation.compute_fingerprint();

        debug!(
            "Invocation for {}: {} copies, fingerprint {}",
            invocation.package,
            invocation.copy_commands.len(),
            invocation.fingerprint
        );
        Ok(invocation)
    }

    /// Hash of the invocation contents, excluding the fingerprint itself
    pub fn compute_fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        let mut field = |value: &str| {
            hasher.update(value.as_bytes());
            hasher.update([0u8]);
        };
        field(&self.package);
        for copy in &self.copy_commands {
            field(&copy.source);
            field(&copy.dest);
            field(&copy.class.to_string());
        }
        field(&self.manifest_json);
        field(&self.public_key);
        field(&self.private_key);
        field(&self.certificate);
        field(&self.certificate_key);
        field(if self.compress { "compress" } else { "" });
        field(if self.no_check_key_name { "no_check_key_name" } else { "" });
        hex::encode(hasher.finalize())
    }
}

/// Compression needs both the product and the package to allow it
pub fn should_compress(package: &Package, config: &BuildConfig) -> bool {
    config.compression && package.flags.compressible && !package.flags.test
}

/// What the make layer needs to install a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeMetadata {
    pub install_path: String,
    pub required_modules: Vec<String>,
    pub overrides: Vec<String>,
    pub installable: bool,
}

impl MakeMetadata {
    pub fn for_package(package: &Package, contents: &PackageContents, compressed: bool) -> Self {
        let suffix = if compressed {
            COMPRESSED_SUFFIX
        } else {
            PACKAGE_SUFFIX
        };
        Self {
            install_path: format!("{}/{}{}", INSTALL_DIR, package.name, suffix),
            required_modules: contents.required_modules.iter().cloned().collect(),
            overrides: package.overrides.clone(),
            installable: package.flags.installable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::PackageFile;
    use crate::decl::Declarations;
    use crate::package::PackageId;
    use std::collections::BTreeSet;

    fn package(extra: &str) -> Package {
        let decls = Declarations::parse(&format!(
            "[[package]]\nname = \"myapex\"\nkey = \"myapex.key\"\n{}",
            extra
        ))
        .unwrap();
        Package::from_decl(&decls.packages[0], Vec::new())
    }

    fn contents() -> PackageContents {
        PackageContents {
            package: PackageId(0),
            files: vec![PackageFile {
                module: "mylib".to_string(),
                source: "out/mylib/arm64_core_myapex/mylib.so".to_string(),
                dest: "lib64/mylib.so".to_string(),
                class: FileClass::NativeSharedLib,
            }],
            provides: BTreeSet::new(),
            requires: BTreeSet::new(),
            required_modules: ["libc", "libm"].iter().map(|s| s.to_string()).collect(),
        }
    }

    fn keys() -> KeyPair {
        KeyPair {
            name: "myapex.key".to_string(),
            public_key: "keys/testkey.avbpubkey".to_string(),
            private_key: "keys/testkey.pem".to_string(),
        }
    }

    fn cert() -> CertificatePair {
        CertificatePair {
            pem: "keys/testkey.x509.pem".to_string(),
            key: "keys/testkey.pk8".to_string(),
        }
    }

    fn invocation(pkg: &Package, config: &BuildConfig) -> PackagingInvocation {
        let manifest = Manifest::new(&pkg.effective_name, 1, Vec::new(), Vec::new());
        PackagingInvocation::build(pkg, &contents(), &manifest, &keys(), &cert(), config).unwrap()
    }

    #[test]
    fn test_invocation_fields() {
        let config = BuildConfig::default();
        let inv = invocation(&package(""), &config);
        assert_eq!(inv.copy_commands.len(), 1);
        assert_eq!(inv.copy_commands[0].dest, "lib64/mylib.so");
        assert!(!inv.no_check_key_name);
        assert!(!inv.compress);
        assert_eq!(inv.fingerprint.len(), 64);
        assert_eq!(inv.fingerprint, inv.compute_fingerprint());
    }

    #[test]
    fn test_fingerprint_tracks_contents() {
        let config = BuildConfig::default();
        let a = invocation(&package(""), &config);
        let b = invocation(&package(""), &config);
        assert_eq!(a.fingerprint, b.fingerprint);

        let c = invocation(&package("apex_name = \"com.android.myapex\"\n"), &config);
        assert!(c.no_check_key_name);
        assert_ne!(a.fingerprint, c.fingerprint);
    }

    #[test]
    fn test_compression_rules() {
        let config = BuildConfig {
            compression: true,
            ..BuildConfig::default()
        };
        assert!(should_compress(&package("compressible = true\n"), &config));
        assert!(!should_compress(&package(""), &config));
        assert!(!should_compress(
            &package("compressible = true\ntest = true\n"),
            &config
        ));
        assert!(!should_compress(
            &package("compressible = true\n"),
            &BuildConfig::default()
        ));
    }

    #[test]
    fn test_make_metadata() {
        let pkg = package("overrides = [\"oldapex\"]\ninstallable = false\n");
        let meta = MakeMetadata::for_package(&pkg, &contents(), false);
        assert_eq!(meta.install_path, "system/apex/myapex.apex");
        assert_eq!(meta.required_modules, vec!["libc", "libm"]);
        assert_eq!(meta.overrides, vec!["oldapex"]);
        assert!(!meta.installable);

        let meta = MakeMetadata::for_package(&pkg, &contents(), true);
        assert_eq!(meta.install_path, "system/apex/myapex.capex");
    }
}
