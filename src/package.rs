// src/package.rs

//! Package records
//!
//! A package is the installable bundle being assembled. Its direct content
//! references are resolved to module ids when the graph is built.

use crate::decl::PackageDecl;
use crate::module::ModuleId;
use serde::Serialize;
use strum_macros::Display;

/// Index of a package in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PackageId(pub usize);

/// Property through which a module is directly listed in a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ContentKind {
    NativeSharedLib,
    Binary,
    Test,
    JavaLib,
    BootFragment,
    Prebuilt,
    App,
}

/// A direct content reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContentRef {
    pub module: ModuleId,
    pub kind: ContentKind,
}

/// Package flags
#[derive(Debug, Clone, Default, Serialize)]
pub struct PackageFlags {
    pub test: bool,
    pub use_vendor: bool,
    pub provides_shared_libs: bool,
    pub compressible: bool,
    pub updatable: bool,
    pub installable: bool,
}

/// A declared package
#[derive(Debug, Clone, Serialize)]
pub struct Package {
    pub name: String,
    /// Name the package installs under
    pub effective_name: String,
    pub content: Vec<ContentRef>,
    pub flags: PackageFlags,
    pub key: String,
    pub certificate: Option<String>,
    /// Packages this one depends on at runtime
    pub uses: Vec<String>,
    pub min_sdk_version: Option<String>,
    pub vndk_version: Option<String>,
    pub overrides: Vec<String>,
    pub version: Option<u64>,
}

impl Package {
    /// Build from a declaration with content already resolved
    pub fn from_decl(decl: &PackageDecl, content: Vec<ContentRef>) -> Self {
        Self {
            name: decl.name.clone(),
            effective_name: decl.apex_name.clone().unwrap_or_else(|| decl.name.clone()),
            content,
            flags: PackageFlags {
                test: decl.test,
                use_vendor: decl.use_vendor,
                provides_shared_libs: decl.provide_cpp_shared_libs,
                compressible: decl.compressible,
                updatable: decl.updatable,
                installable: decl.installable,
            },
            key: decl.key.clone(),
            certificate: decl.certificate.clone(),
            uses: decl.uses.clone(),
            min_sdk_version: decl.min_sdk_version.clone(),
            vndk_version: decl.vndk_version.clone(),
            overrides: decl.overrides.clone(),
            version: decl.version,
        }
    }

    /// Whether `module` is listed directly in this package
    pub fn contains_directly(&self, module: ModuleId) -> bool {
        self.content.iter().any(|c| c.module == module)
    }

    /// Whether the key module name differs from the package name
    pub fn key_name_differs(&self) -> bool {
        let key_stem = self.key.strip_suffix(".key").unwrap_or(&self.key);
        key_stem != self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(name: &str, key: &str) -> PackageDecl {
        crate::decl::Declarations::parse(&format!(
            "[[package]]\nname = \"{}\"\nkey = \"{}\"\napex_name = \"com.android.{}\"\n",
            name, key, name
        ))
        .unwrap()
        .packages
        .remove(0)
    }

    #[test]
    fn test_from_decl() {
        let pkg = Package::from_decl(
            &decl("myapex", "myapex.key"),
            vec![ContentRef {
                module: ModuleId(3),
                kind: ContentKind::NativeSharedLib,
            }],
        );
        assert_eq!(pkg.effective_name, "com.android.myapex");
        assert!(pkg.flags.installable);
        assert!(pkg.contains_directly(ModuleId(3)));
        assert!(!pkg.contains_directly(ModuleId(4)));
        assert!(!pkg.key_name_differs());
    }

    #[test]
    fn test_key_name_differs() {
        let pkg = Package::from_decl(&decl("myapex", "otherapex.key"), vec![]);
        assert!(pkg.key_name_differs());
        assert_eq!(ContentKind::NativeSharedLib.to_string(), "native_shared_lib");
    }
}
